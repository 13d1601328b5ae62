//! Edge handler that relays a private iCalendar feed and keeps only the
//! events whose summary contains a filter text.

pub mod config;
pub mod handler;
pub mod ics;
pub mod server;
pub mod upstream;

pub use config::Config;
pub use handler::handle_request;
pub use server::AppState;
