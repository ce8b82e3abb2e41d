//! Notes list and search view state.
//!
//! Idle -> Loading -> Loaded | Errored. Each load is tagged with a
//! sequence number; only the response to the most recently issued load is
//! applied, so a slow earlier search cannot overwrite a newer result.

use crate::models::{Note, NotePage};
use crate::views::swipe::SwipeTracker;

/// Banner text when the first page or a later page fails
pub const MSG_FETCH_FAILED: &str = "Failed to fetch notes.";

pub const MSG_DELETE_FAILED: &str = "Failed to delete note";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// What a request is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadKind {
    /// Replace the list with the first page
    FirstPage,
    /// Append the page after `cursor`
    NextPage { cursor: String },
    /// Replace the list with notes matching the query
    Search { query: String },
}

/// Handle for an issued load; pass it back with the outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub seq: u64,
    pub kind: LoadKind,
}

#[derive(Debug, Clone)]
pub struct ListView {
    notes: Vec<Note>,
    cursor: Option<String>,
    has_more: bool,
    state: LoadState,
    search_query: String,
    latest_seq: u64,
    /// List pages currently shown; 0 for search results
    pages_loaded: u32,
    swipe: SwipeTracker,
}

impl Default for ListView {
    fn default() -> Self {
        Self::new()
    }
}

impl ListView {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            cursor: None,
            has_more: true,
            state: LoadState::Idle,
            search_query: String::new(),
            latest_seq: 0,
            pages_loaded: 0,
            swipe: SwipeTracker::new(),
        }
    }

    fn issue(&mut self, kind: LoadKind) -> RequestTicket {
        self.latest_seq += 1;
        self.state = LoadState::Loading;
        RequestTicket {
            seq: self.latest_seq,
            kind,
        }
    }

    fn is_current(&self, ticket: &RequestTicket) -> bool {
        if ticket.seq != self.latest_seq {
            tracing::debug!(
                "Discarding stale response seq={} latest={}",
                ticket.seq,
                self.latest_seq
            );
            return false;
        }
        true
    }

    /// Load the first page (initial mount, or search cleared).
    pub fn begin_first_page(&mut self) -> RequestTicket {
        self.issue(LoadKind::FirstPage)
    }

    /// Load the next page. `None` while a load is in flight or when nothing is left.
    pub fn begin_load_more(&mut self) -> Option<RequestTicket> {
        if self.is_loading() || !self.has_more {
            return None;
        }
        let cursor = self.cursor.clone()?;
        Some(self.issue(LoadKind::NextPage { cursor }))
    }

    /// Record what is typed in the search box. No request is made.
    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    /// Run the (already debounced) query. An empty query reloads the first page.
    pub fn begin_search(&mut self, query: &str) -> RequestTicket {
        self.search_query = query.to_string();
        if query.is_empty() {
            self.issue(LoadKind::FirstPage)
        } else {
            self.issue(LoadKind::Search {
                query: query.to_string(),
            })
        }
    }

    /// Apply a list page. Returns false if the ticket was superseded.
    pub fn apply_page(&mut self, ticket: &RequestTicket, page: NotePage) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        match ticket.kind {
            LoadKind::NextPage { .. } => {
                self.notes.extend(page.results);
                self.pages_loaded += 1;
            }
            _ => {
                self.notes = page.results;
                self.pages_loaded = 1;
            }
        }
        self.cursor = page.next_cursor;
        self.has_more = page.has_more;
        self.state = LoadState::Loaded;
        true
    }

    /// Apply search results, replacing the list. Returns false if superseded.
    pub fn apply_search_results(&mut self, ticket: &RequestTicket, notes: Vec<Note>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.notes = notes;
        // Search results are a single, uncursored set
        self.cursor = None;
        self.pages_loaded = 0;
        self.has_more = false;
        self.state = LoadState::Loaded;
        true
    }

    /// Record a failed load. Returns false if superseded.
    pub fn apply_error(&mut self, ticket: &RequestTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = LoadState::Errored(message.into());
        true
    }

    /// Drop a note after the service confirmed its deletion.
    pub fn remove_note(&mut self, note_id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != note_id);
        self.swipe.forget(note_id);
        self.notes.len() < before
    }

    /// Show a failure that is not tied to a load (e.g. a delete)
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.state = LoadState::Errored(message.into());
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            LoadState::Errored(message) => Some(message),
            _ => None,
        }
    }

    pub fn swipe(&self) -> &SwipeTracker {
        &self.swipe
    }

    pub fn swipe_mut(&mut self) -> &mut SwipeTracker {
        &mut self.swipe
    }
}
