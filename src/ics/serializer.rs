use std::fmt;

use super::models::{Feed, Properties};

fn write_properties(f: &mut fmt::Formatter<'_>, properties: &Properties) -> fmt::Result {
    for (key, value) in properties.iter() {
        writeln!(f, "{}:{}", key, value)?;
    }
    Ok(())
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BEGIN:VCALENDAR")?;
        if let Some(header) = &self.header {
            write_properties(f, header)?;
        }
        for event in &self.events {
            writeln!(f, "BEGIN:VEVENT")?;
            write_properties(f, event)?;
            writeln!(f, "END:VEVENT")?;
        }
        writeln!(f, "END:VCALENDAR")
    }
}

/// Renders `feed` as an ICS document with `\n` line endings.
pub fn to_ics(feed: &Feed) -> String {
    feed.to_string()
}
