pub mod models;
pub mod parser;
pub mod serializer;

pub use models::{Event, EventFilter, Feed, Header, Properties};
pub use parser::{KeyMode, ParseOptions, parse};
pub use serializer::to_ics;

/// Parses `input`, keeps the events matching `filter` and renders the result.
pub fn filter_feed(input: &str, options: &ParseOptions, filter: &EventFilter) -> String {
    let feed = parse(input, options);
    to_ics(&filter.apply(feed))
}
