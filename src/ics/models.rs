use serde::ser::{Serialize, SerializeMap, Serializer};

/// Property name/value pairs of one block, kept in insertion order.
///
/// Assigning a key that already exists replaces its value in place, so the
/// last occurrence wins but the key keeps the position it was first seen at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(Vec<(String, String)>);

pub type Header = Properties;
pub type Event = Properties;

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One parsed ICS document.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Feed {
    /// Calendar-level properties. Only captured when header support is on
    /// and the document opened a `VCALENDAR` block.
    pub header: Option<Header>,
    pub events: Vec<Event>,
}

/// Keeps the events whose `field` contains `needle` (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub field: String,
    pub needle: String,
}

impl EventFilter {
    pub const DEFAULT_FIELD: &'static str = "SUMMARY";

    pub fn new(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn on_summary(needle: impl Into<String>) -> Self {
        Self::new(Self::DEFAULT_FIELD, needle)
    }

    /// Events lacking the field never match.
    pub fn matches(&self, event: &Event) -> bool {
        event
            .get(&self.field)
            .is_some_and(|value| value.contains(self.needle.as_str()))
    }

    pub fn apply(&self, feed: Feed) -> Feed {
        Feed {
            header: feed.header,
            events: feed
                .events
                .into_iter()
                .filter(|event| self.matches(event))
                .collect(),
        }
    }
}
