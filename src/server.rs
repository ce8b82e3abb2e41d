//! HTTP server using Axum.
//!
//! JSON API, mounted under `/api`:
//! - GET    /api/notes          - List notes (`startCursor`, `pageSize`)
//! - POST   /api/notes          - Create a note; answers with the new
//!                                  note as a `Note`, not the external page
//! - DELETE /api/notes?id=      - Delete a note (query-string form)
//! - GET    /api/notes/:id      - Get a note with its blocks
//! - DELETE /api/notes/:id      - Delete a note
//! - POST   /api/notes/search   - Search notes by title
//! - GET    /api/status         - Health check
//!
//! Server-rendered pages:
//! - GET  /                     - Notes list (`q`, `pages` = pages of notes shown)
//! - GET  /notes/new            - Create form
//! - POST /notes/new            - Create form submit
//! - GET  /notes/:id            - Note detail
//! - POST /notes/:id/delete     - Delete from the list page
//!
//! Every JSON error is `{ "error": message }` with status 400 for bad
//! input and 500 for anything else.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{NotesError, NotesResult};
use crate::html;
use crate::notes_api::NotesApi;
use crate::notion::NotesService;
use crate::validation::resolve_page_size;
use crate::views::{
    CreateForm, DetailView, ListView, LoadKind, NewNote, RequestTicket, MSG_DELETE_FAILED,
    MSG_DETAIL_FAILED, MSG_FETCH_FAILED,
};

/// Server shutdown handle
static SHUTDOWN_TX: OnceLock<Mutex<Option<oneshot::Sender<()>>>> = OnceLock::new();

/// Shared server state
struct AppState<S> {
    api: Arc<NotesApi<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

// Request/Response types

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "startCursor")]
    start_cursor: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(default, rename = "searchQuery")]
    search_query: String,
}

#[derive(Debug, Deserialize)]
struct ListPageParams {
    q: Option<String>,
    /// How many list pages to show
    pages: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

/// Status code for an error: 400 for caller mistakes, 500 for everything else
pub fn status_for(err: &NotesError) -> StatusCode {
    if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(err: NotesError) -> Response {
    let status = status_for(&err);
    if status == StatusCode::BAD_REQUEST {
        tracing::warn!("Rejected request: {}", err);
    } else {
        tracing::error!("Request failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    tracing::warn!("Malformed request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: rejection.body_text(),
        }),
    )
        .into_response()
}

// JSON API handlers

async fn list_notes<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Response {
    tracing::debug!(
        "GET /api/notes startCursor={:?} pageSize={:?}",
        params.start_cursor,
        params.page_size
    );
    let page_size = resolve_page_size(params.page_size.as_deref(), state.api.default_page_size());

    match state.api.list_notes(params.start_cursor.as_deref(), Some(page_size)).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_note<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    tracing::debug!("GET /api/notes/{}", id);

    match state.api.get_note(Some(&id)).await {
        Ok(detail) => Json(detail).into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_note<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<NewNote>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    tracing::debug!("POST /api/notes title={:?}", request.title);

    match state.api.create_note(&request.title, &request.content).await {
        Ok(note) => Json(note).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_note<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    tracing::debug!("DELETE /api/notes/{}", id);
    delete_response(&state, Some(&id)).await
}

async fn delete_note_by_query<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<IdParams>,
) -> Response {
    tracing::debug!("DELETE /api/notes?id={:?}", params.id);
    delete_response(&state, params.id.as_deref()).await
}

async fn delete_response<S: NotesService>(state: &AppState<S>, id: Option<&str>) -> Response {
    match state.api.delete_note(id).await {
        Ok(message) => Json(MessageResponse {
            message: message.to_string(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn search_notes<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    tracing::debug!("POST /api/notes/search query={:?}", request.search_query);

    match state.api.search_notes(&request.search_query).await {
        Ok(notes) => Json(notes).into_response(),
        Err(e) => error_response(e),
    }
}

async fn status() -> impl IntoResponse {
    Json(StatusResponse { status: "ok" })
}

// Page handlers

/// Upper bound on list pages replayed for one page view
pub const MAX_LIST_PAGES: u32 = 50;

/// Run one load against the API and feed the outcome to `view`
async fn load_into<S: NotesService>(api: &NotesApi<S>, view: &mut ListView, ticket: RequestTicket) {
    match &ticket.kind {
        LoadKind::Search { query } => match api.search_notes(query).await {
            Ok(notes) => view.apply_search_results(&ticket, notes),
            Err(e) => {
                tracing::error!("Search page failed: {}", e);
                view.apply_error(&ticket, MSG_FETCH_FAILED)
            }
        },
        LoadKind::FirstPage => match api.list_notes(None, None).await {
            Ok(page) => view.apply_page(&ticket, page),
            Err(e) => {
                tracing::error!("List page failed: {}", e);
                view.apply_error(&ticket, MSG_FETCH_FAILED)
            }
        },
        LoadKind::NextPage { cursor } => match api.list_notes(Some(cursor), None).await {
            Ok(page) => view.apply_page(&ticket, page),
            Err(e) => {
                tracing::error!("Loading more notes failed: {}", e);
                view.apply_error(&ticket, MSG_FETCH_FAILED)
            }
        },
    };
}

async fn list_page<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListPageParams>,
) -> Response {
    let query = params.q.unwrap_or_default();
    let pages = params
        .pages
        .and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_LIST_PAGES);
    tracing::debug!("GET / q={:?} pages={}", query, pages);

    let mut view = ListView::new();
    let ticket = view.begin_search(query.trim());
    load_into(&state.api, &mut view, ticket).await;

    // Each further page appends through the stored cursor
    for _ in 1..pages {
        if view.error_message().is_some() {
            break;
        }
        let Some(ticket) = view.begin_load_more() else {
            break;
        };
        load_into(&state.api, &mut view, ticket).await;
    }

    let status = if view.error_message().is_some() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Html(html::list_page(&view))).into_response()
}

async fn new_note_page() -> Html<String> {
    Html(html::create_page(&CreateForm::new()))
}

async fn submit_note_page<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Form(submitted): Form<NewNote>,
) -> Response {
    let mut form = CreateForm::with_values(submitted.title, submitted.content);
    let Some(request) = form.begin_submit() else {
        return (StatusCode::BAD_REQUEST, Html(html::create_page(&form))).into_response();
    };

    match state.api.create_note(&request.title, &request.content).await {
        Ok(note) => {
            tracing::info!("Created note {}", note.id);
            Redirect::to(&form.submit_succeeded(&note)).into_response()
        }
        Err(e) => {
            tracing::error!("Create page failed: {}", e);
            let status = status_for(&e);
            form.submit_failed(&e.to_string());
            (status, Html(html::create_page(&form))).into_response()
        }
    }
}

async fn note_page<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    match state.api.get_note_tree(Some(&id)).await {
        Ok(detail) => Html(html::detail_page(&DetailView::loaded(detail))).into_response(),
        Err(e) => {
            tracing::error!("Detail page for {} failed: {}", id, e);
            let view = DetailView::errored(MSG_DETAIL_FAILED);
            (status_for(&e), Html(html::detail_page(&view))).into_response()
        }
    }
}

async fn delete_note_page<S: NotesService + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    match state.api.delete_note(Some(&id)).await {
        Ok(_) => {
            tracing::info!("Archived note {}", id);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::error!("Delete of {} failed: {}", id, e);
            let mut view = ListView::new();
            view.show_error(MSG_DELETE_FAILED);
            (status_for(&e), Html(html::list_page(&view))).into_response()
        }
    }
}

/// Create the application router
pub fn create_router<S: NotesService + 'static>(api: Arc<NotesApi<S>>) -> Router {
    let state = AppState { api };

    let json_api = Router::new()
        .route(
            "/notes",
            get(list_notes::<S>)
                .post(create_note::<S>)
                .delete(delete_note_by_query::<S>),
        )
        .route("/notes/search", post(search_notes::<S>))
        .route("/notes/:id", get(get_note::<S>).delete(delete_note::<S>))
        .route("/status", get(status));

    Router::new()
        .route("/", get(list_page::<S>))
        .route("/notes/new", get(new_note_page).post(submit_note_page::<S>))
        .route("/notes/:id", get(note_page::<S>))
        .route("/notes/:id/delete", post(delete_note_page::<S>))
        .nest("/api", json_api)
        .with_state(state)
}

/// Start the server and run until [`stop_server`] is called
pub async fn start_server<S: NotesService + 'static>(
    api: Arc<NotesApi<S>>,
    addr: SocketAddr,
) -> NotesResult<()> {
    let router = create_router(api);

    let (tx, rx) = oneshot::channel::<()>();
    let slot = SHUTDOWN_TX.get_or_init(|| Mutex::new(None));
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(tx);
    }

    tracing::info!("Starting notes server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| NotesError::Network(e.to_string()))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            rx.await.ok();
        })
        .await
        .map_err(|e| NotesError::Network(e.to_string()))?;

    tracing::info!("Notes server stopped");
    Ok(())
}

/// Stop the server
pub fn stop_server() {
    if let Some(mutex) = SHUTDOWN_TX.get() {
        if let Ok(mut guard) = mutex.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
    }
}
