use log::trace;

use super::models::{Event, Feed, Header};

const BEGIN_CALENDAR: &str = "BEGIN:VCALENDAR";
const END_CALENDAR: &str = "END:VCALENDAR";
const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// How property keys are recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyMode {
    /// Anything before the first colon is a key.
    #[default]
    Permissive,
    /// Only keys made of ASCII uppercase letters; other lines are dropped.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub key_mode: KeyMode,
    /// Capture calendar-level properties into `Feed::header`.
    pub headers: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            key_mode: KeyMode::Permissive,
            headers: true,
        }
    }
}

/// Splits `KEY:VALUE` at the first colon.
fn split_property(line: &str, key_mode: KeyMode) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let accepted = match key_mode {
        KeyMode::Permissive => !key.is_empty(),
        KeyMode::Strict => !key.is_empty() && key.bytes().all(|b| b.is_ascii_uppercase()),
    };
    accepted.then_some((key, value))
}

/// Best-effort parse of an ICS document. Never fails: lines that are not
/// properties, or that appear outside any open block, are dropped. An event
/// without a closing `END:VEVENT` is dropped as well.
pub fn parse(input: &str, options: &ParseOptions) -> Feed {
    let mut header: Option<Header> = None;
    let mut events = Vec::new();
    let mut current: Option<Event> = None;
    let mut dropped = 0usize;

    for line in input.split('\n').map(str::trim) {
        match line {
            "" => {}
            BEGIN_CALENDAR => {
                if options.headers {
                    header = Some(Header::new());
                }
            }
            END_CALENDAR => {}
            BEGIN_EVENT => current = Some(Event::new()),
            END_EVENT => {
                if let Some(event) = current.take() {
                    events.push(event);
                }
            }
            _ => {
                let target = match (current.as_mut(), header.as_mut()) {
                    (Some(event), _) => Some(event),
                    (None, Some(header)) => Some(header),
                    (None, None) => None,
                };
                match (target, split_property(line, options.key_mode)) {
                    (Some(target), Some((key, value))) => target.insert(key, value),
                    _ => dropped += 1,
                }
            }
        }
    }

    if current.is_some() {
        trace!("Dropping unterminated VEVENT block");
    }
    trace!("Parsed {} events, dropped {} lines", events.len(), dropped);

    Feed { header, events }
}
