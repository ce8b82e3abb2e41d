//! UI state for the notes views.
//!
//! These types hold no I/O: callers start a request, perform it however
//! they like, and feed the outcome back. [`crate::client::ListController`]
//! drives them over HTTP; the server's HTML pages build them from API
//! results directly.

pub mod create;
pub mod detail;
pub mod list;
pub mod swipe;

use chrono::{DateTime, Utc};

pub use create::{CreateForm, NewNote};
pub use detail::{DetailView, MSG_DETAIL_FAILED};
pub use list::{ListView, LoadKind, LoadState, RequestTicket, MSG_DELETE_FAILED, MSG_FETCH_FAILED};
pub use swipe::{ClickOutcome, SwipeTracker};

/// Display format for note timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
