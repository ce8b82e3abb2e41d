//! Client for the app's own JSON API.
//!
//! [`NotesApiClient`] talks to the `/api` routes over HTTP. Every failure,
//! whether the request never completed, the body did not decode, or the
//! server answered `{ "error": .. }`, surfaces as
//! [`NotesError::ClientFetch`] so the UI can show it inline.
//!
//! [`ListController`] wires the client to a [`ListView`]: it issues
//! loads, debounces search input and applies only the latest response.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::debounce::Debouncer;
use crate::error::{NotesError, NotesResult};
use crate::models::{Note, NoteDetail, NotePage};
use crate::views::{
    ListView, LoadKind, NewNote, RequestTicket, SwipeTracker, MSG_DELETE_FAILED, MSG_FETCH_FAILED,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    #[serde(rename = "searchQuery")]
    search_query: &'a str,
}

/// HTTP client for the notes JSON API
#[derive(Debug, Clone)]
pub struct NotesApiClient {
    base_url: String,
    client: Client,
}

impl NotesApiClient {
    /// `base_url` is the app's origin, e.g. `http://127.0.0.1:3000`
    pub fn new(base_url: impl Into<String>) -> NotesResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotesError::client_fetch(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn receive<T: DeserializeOwned>(response: reqwest::Result<Response>) -> NotesResult<T> {
        let response = response.map_err(|e| NotesError::client_fetch(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => body.error,
                Err(_) => format!("HTTP {}", status),
            };
            return Err(NotesError::client_fetch(message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NotesError::client_fetch(e.to_string()))
    }

    /// One page of notes. `None` for the first page.
    pub async fn list_notes(&self, cursor: Option<&str>, page_size: Option<u32>) -> NotesResult<NotePage> {
        let mut url = format!(
            "{}?startCursor={}",
            self.url("/notes"),
            urlencoding::encode(cursor.unwrap_or(""))
        );
        if let Some(size) = page_size {
            url.push_str(&format!("&pageSize={}", size));
        }

        tracing::debug!("Fetching notes page cursor={:?}", cursor);
        Self::receive(self.client.get(url).send().await).await
    }

    pub async fn get_note(&self, id: &str) -> NotesResult<NoteDetail> {
        let url = self.url(&format!("/notes/{}", urlencoding::encode(id)));
        Self::receive(self.client.get(url).send().await).await
    }

    pub async fn create_note(&self, note: &NewNote) -> NotesResult<Note> {
        Self::receive(self.client.post(self.url("/notes")).json(note).send().await).await
    }

    /// Delete a note, returning the server's confirmation message
    pub async fn delete_note(&self, id: &str) -> NotesResult<String> {
        let url = self.url(&format!("/notes/{}", urlencoding::encode(id)));
        let body: MessageBody = Self::receive(self.client.delete(url).send().await).await?;
        Ok(body.message)
    }

    pub async fn search_notes(&self, query: &str) -> NotesResult<Vec<Note>> {
        let body = SearchBody { search_query: query };
        Self::receive(self.client.post(self.url("/notes/search")).json(&body).send().await).await
    }
}

/// Drives a [`ListView`] against the JSON API.
///
/// Clones share one view. The view lock is only held to start a load or
/// apply its outcome, never across a request.
#[derive(Debug, Clone)]
pub struct ListController {
    client: NotesApiClient,
    view: Arc<Mutex<ListView>>,
    debouncer: Debouncer,
    page_size: Option<u32>,
}

impl ListController {
    pub fn new(client: NotesApiClient) -> Self {
        Self {
            client,
            view: Arc::new(Mutex::new(ListView::new())),
            debouncer: Debouncer::default(),
            page_size: None,
        }
    }

    /// Request pages of `size` instead of the server's default
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn with_debouncer(mut self, debouncer: Debouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    fn with_view<R>(&self, f: impl FnOnce(&mut ListView) -> R) -> R {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut view)
    }

    /// Snapshot of the current view state
    pub fn view(&self) -> ListView {
        self.with_view(|view| view.clone())
    }

    /// Apply a gesture to the list's swipe state
    pub fn swipe<R>(&self, f: impl FnOnce(&mut SwipeTracker) -> R) -> R {
        self.with_view(|view| f(view.swipe_mut()))
    }

    /// Load the first page
    pub async fn mount(&self) -> bool {
        let ticket = self.with_view(ListView::begin_first_page);
        self.run(ticket).await
    }

    /// Load the next page; a no-op while loading or when nothing is left
    pub async fn load_more(&self) -> bool {
        match self.with_view(ListView::begin_load_more) {
            Some(ticket) => self.run(ticket).await,
            None => false,
        }
    }

    /// Handle a change of the search box. Returns true only for the input
    /// whose results were applied.
    pub async fn search_input(&self, query: &str) -> bool {
        self.with_view(|view| view.set_search_query(query));

        let Some(query) = self.debouncer.settle(query.to_string()).await else {
            tracing::trace!("Search input superseded");
            return false;
        };

        let ticket = self.with_view(|view| view.begin_search(&query));
        self.run(ticket).await
    }

    /// Delete a note and drop it from the list once the server confirms
    pub async fn delete(&self, note_id: &str) -> bool {
        match self.client.delete_note(note_id).await {
            Ok(_) => self.with_view(|view| view.remove_note(note_id)),
            Err(e) => {
                tracing::warn!("Delete of {} failed: {}", note_id, e);
                self.with_view(|view| view.show_error(MSG_DELETE_FAILED));
                false
            }
        }
    }

    async fn run(&self, ticket: RequestTicket) -> bool {
        match &ticket.kind {
            LoadKind::FirstPage => {
                let result = self.client.list_notes(None, self.page_size).await;
                self.apply_page(&ticket, result)
            }
            LoadKind::NextPage { cursor } => {
                let result = self.client.list_notes(Some(cursor), self.page_size).await;
                self.apply_page(&ticket, result)
            }
            LoadKind::Search { query } => {
                let result = self.client.search_notes(query).await;
                self.with_view(|view| match result {
                    Ok(notes) => view.apply_search_results(&ticket, notes),
                    Err(e) => {
                        tracing::warn!("Search failed: {}", e);
                        view.apply_error(&ticket, MSG_FETCH_FAILED)
                    }
                })
            }
        }
    }

    fn apply_page(&self, ticket: &RequestTicket, result: NotesResult<NotePage>) -> bool {
        self.with_view(|view| match result {
            Ok(page) => view.apply_page(ticket, page),
            Err(e) => {
                tracing::warn!("Loading notes failed: {}", e);
                view.apply_error(ticket, MSG_FETCH_FAILED)
            }
        })
    }
}
