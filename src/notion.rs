//! Client for the external document-database service (the Notion API).
//!
//! [`NotesService`] is the seam between the notes API layer and the
//! service. [`NotionClient`] implements it over HTTPS; tests substitute an
//! in-memory implementation.
//!
//! Every call is a single request with no retry. Failures are returned to
//! the caller as one terminal error.

use std::future::Future;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{NotesError, NotesResult};
use crate::models::{ContentBlock, NotionPage};
use crate::validation::{chunk_rich_text, MAX_PAGE_SIZE};

/// A page of results from any list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Parameters for a database query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesQuery {
    pub start_cursor: Option<String>,
    pub page_size: Option<u32>,
    /// Only return pages whose title contains this text
    pub title_contains: Option<String>,
}

/// Error body returned by the external service
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Operations the notes application needs from the document database.
pub trait NotesService: Send + Sync {
    /// Query the notes database, newest edit first.
    fn query_notes(
        &self,
        query: NotesQuery,
    ) -> impl Future<Output = NotesResult<ListResponse<NotionPage>>> + Send;

    /// Retrieve a page by id.
    fn retrieve_page(&self, page_id: &str) -> impl Future<Output = NotesResult<NotionPage>> + Send;

    /// List one page of a block's (or page's) direct children.
    fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> impl Future<Output = NotesResult<ListResponse<ContentBlock>>> + Send;

    /// Create a page in the notes database with one plain-text paragraph.
    fn create_page(
        &self,
        title: &str,
        content: &str,
    ) -> impl Future<Output = NotesResult<NotionPage>> + Send;

    /// Set the archived flag on a page.
    fn archive_page(&self, page_id: &str) -> impl Future<Output = NotesResult<NotionPage>> + Send;
}

/// Body for `POST /databases/{id}/query`
pub fn query_body(query: &NotesQuery, title_property: &str) -> Value {
    let mut body = json!({
        "sorts": [
            { "timestamp": "last_edited_time", "direction": "descending" }
        ],
    });

    if let Some(page_size) = query.page_size {
        body["page_size"] = json!(page_size.clamp(1, MAX_PAGE_SIZE));
    }
    if let Some(cursor) = &query.start_cursor {
        body["start_cursor"] = json!(cursor);
    }
    if let Some(needle) = &query.title_contains {
        body["filter"] = json!({
            "property": title_property,
            "title": { "contains": needle },
        });
    }

    body
}

/// Body for `POST /pages`: a title plus a single unformatted paragraph
pub fn create_page_body(database_id: &str, title_property: &str, title: &str, content: &str) -> Value {
    let rich_text: Vec<Value> = chunk_rich_text(content)
        .into_iter()
        .map(|chunk| json!({ "type": "text", "text": { "content": chunk } }))
        .collect();

    let mut properties = serde_json::Map::new();
    properties.insert(
        title_property.to_string(),
        json!({ "title": [{ "type": "text", "text": { "content": title } }] }),
    );

    json!({
        "parent": { "database_id": database_id },
        "properties": properties,
        "children": [
            {
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": rich_text },
            }
        ],
    })
}

/// HTTP client for the Notion API
#[derive(Clone)]
pub struct NotionClient {
    config: Arc<Config>,
    client: Client,
}

impl NotionClient {
    /// Create a new client. Credentials are taken from `config` once and never change.
    pub fn new(config: Arc<Config>) -> NotesResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key()))
            .map_err(|_| NotesError::Config("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let version = HeaderValue::from_str(config.notion_version())
            .map_err(|_| NotesError::Config("Invalid Notion-Version value".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", version);

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| NotesError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url(), path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> NotesResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| NotesError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(api_error) => NotesError::External {
                    status: Some(status.as_u16()),
                    code: api_error.code,
                    message: api_error.message,
                },
                Err(_) => NotesError::External {
                    status: Some(status.as_u16()),
                    code: None,
                    message: format!("Request failed with status {}", status),
                },
            };
            tracing::debug!("External service returned {}: {}", status, error);
            return Err(error);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NotesError::external(format!("Failed to parse response: {}", e)))
    }
}

impl NotesService for NotionClient {
    async fn query_notes(&self, query: NotesQuery) -> NotesResult<ListResponse<NotionPage>> {
        let database_id = urlencoding::encode(self.config.database_id());
        tracing::debug!(
            cursor = ?query.start_cursor,
            page_size = ?query.page_size,
            title_contains = ?query.title_contains,
            "Querying notes database"
        );

        let request = self
            .client
            .post(self.url(&format!("/databases/{}/query", database_id)))
            .json(&query_body(&query, self.config.title_property()));
        let response: ListResponse<NotionPage> = self.send(request).await?;

        tracing::trace!(
            "Query returned {} pages, has_more={}",
            response.results.len(),
            response.has_more
        );
        Ok(response)
    }

    async fn retrieve_page(&self, page_id: &str) -> NotesResult<NotionPage> {
        tracing::debug!("Retrieving page {}", page_id);
        let request = self
            .client
            .get(self.url(&format!("/pages/{}", urlencoding::encode(page_id))));
        self.send(request).await
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> NotesResult<ListResponse<ContentBlock>> {
        tracing::debug!("Listing children of {} cursor={:?}", block_id, start_cursor);

        let mut url = format!(
            "/blocks/{}/children?page_size={}",
            urlencoding::encode(block_id),
            MAX_PAGE_SIZE
        );
        if let Some(cursor) = start_cursor {
            url.push_str(&format!("&start_cursor={}", urlencoding::encode(cursor)));
        }

        self.send(self.client.get(self.url(&url))).await
    }

    async fn create_page(&self, title: &str, content: &str) -> NotesResult<NotionPage> {
        tracing::debug!("Creating page titled {:?} ({} chars of content)", title, content.len());
        let body = create_page_body(
            self.config.database_id(),
            self.config.title_property(),
            title,
            content,
        );
        let page: NotionPage = self.send(self.client.post(self.url("/pages")).json(&body)).await?;
        tracing::info!(page_id = %page.id, "Created note");
        Ok(page)
    }

    async fn archive_page(&self, page_id: &str) -> NotesResult<NotionPage> {
        tracing::debug!("Archiving page {}", page_id);
        let request = self
            .client
            .patch(self.url(&format!("/pages/{}", urlencoding::encode(page_id))))
            .json(&json!({ "archived": true }));
        let page: NotionPage = self.send(request).await?;
        tracing::info!(page_id = %page.id, "Archived note");
        Ok(page)
    }
}


/// Tests against a local stand-in for the external API
#[cfg(all(test, feature = "server"))]
mod http_tests {
    use super::*;
    use std::sync::Mutex;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use crate::config::ConfigData;

    #[derive(Clone, Default)]
    struct Seen {
        bodies: Arc<Mutex<Vec<Value>>>,
        auth: Arc<Mutex<Vec<String>>>,
    }

    fn page(id: &str, title: &str, archived: bool) -> Value {
        json!({
            "object": "page",
            "id": id,
            "created_time": "2024-03-01T10:00:00.000Z",
            "last_edited_time": "2024-03-02T10:00:00.000Z",
            "archived": archived,
            "properties": {
                "Name": { "id": "title", "type": "title", "title": [
                    { "type": "text", "text": { "content": title }, "plain_text": title }
                ]}
            }
        })
    }

    async fn spawn_stub() -> (String, Seen) {
        let seen = Seen::default();

        let app = Router::new()
            .route(
                "/v1/databases/:db/query",
                post(
                    |State(seen): State<Seen>, headers: AxumHeaders, Json(body): Json<Value>| async move {
                        if let Some(auth) = headers.get("authorization") {
                            seen.auth.lock().unwrap().push(auth.to_str().unwrap().to_string());
                        }
                        seen.bodies.lock().unwrap().push(body);
                        Json(json!({
                            "object": "list",
                            "results": [page("p1", "Groceries list", false)],
                            "next_cursor": "c2",
                            "has_more": true
                        }))
                    },
                ),
            )
            .route(
                "/v1/pages/:id",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        (
                            StatusCode::NOT_FOUND,
                            Json(json!({
                                "object": "error",
                                "status": 404,
                                "code": "object_not_found",
                                "message": "Could not find page with ID: missing."
                            })),
                        )
                    } else {
                        (StatusCode::OK, Json(page(&id, "Fetched", false)))
                    }
                })
                .patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    assert_eq!(body["archived"], true);
                    Json(page(&id, "Archived", true))
                }),
            )
            .route(
                "/v1/pages",
                post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                    seen.bodies.lock().unwrap().push(body);
                    Json(page("new-page", "Created", false))
                }),
            )
            .route(
                "/v1/blocks/:id/children",
                get(|| async {
                    (StatusCode::BAD_GATEWAY, "upstream exploded")
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1", addr), seen)
    }

    fn client_for(base_url: &str) -> NotionClient {
        let data = ConfigData {
            api_key: Some("secret_test".to_string()),
            database_id: Some("db1".to_string()),
            api_base_url: base_url.to_string(),
            ..ConfigData::default()
        };
        NotionClient::new(Arc::new(Config::from_data(data).unwrap())).unwrap()
    }

    #[tokio::test]
    async fn test_query_notes_sends_auth_and_parses_pages() {
        let (base_url, seen) = spawn_stub().await;
        let client = client_for(&base_url);

        let response = client
            .query_notes(NotesQuery {
                start_cursor: None,
                page_size: Some(10),
                title_contains: None,
            })
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].title(), "Groceries list");
        assert_eq!(response.next_cursor.as_deref(), Some("c2"));
        assert!(response.has_more);
        assert_eq!(seen.auth.lock().unwrap()[0], "Bearer secret_test");
        assert_eq!(seen.bodies.lock().unwrap()[0]["page_size"], 10);
    }

    #[tokio::test]
    async fn test_retrieve_missing_page_surfaces_service_message() {
        let (base_url, _seen) = spawn_stub().await;
        let client = client_for(&base_url);

        let err = client.retrieve_page("missing").await.unwrap_err();
        match err {
            NotesError::External { status, code, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(code.as_deref(), Some("object_not_found"));
                assert_eq!(message, "Could not find page with ID: missing.");
            }
            other => panic!("expected external error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let (base_url, _seen) = spawn_stub().await;
        let client = client_for(&base_url);

        let err = client.list_block_children("p1", None).await.unwrap_err();
        assert!(matches!(err, NotesError::External { status: Some(502), .. }));
    }

    #[tokio::test]
    async fn test_create_and_archive() {
        let (base_url, seen) = spawn_stub().await;
        let client = client_for(&base_url);

        let created = client.create_page("Created", "body text").await.unwrap();
        assert_eq!(created.id, "new-page");
        let body = seen.bodies.lock().unwrap()[0].clone();
        assert_eq!(body["parent"]["database_id"], "db1");

        let archived = client.archive_page("new-page").await.unwrap();
        assert!(archived.archived);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let client = client_for("http://127.0.0.1:1/v1");
        let err = client.retrieve_page("p1").await.unwrap_err();
        assert!(matches!(err, NotesError::Network(_)));
    }
}
