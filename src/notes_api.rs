//! Notes API layer.
//!
//! Thin operations over a [`NotesService`]: validate input, make one call
//! to the external service, and translate the result into application
//! models. Validation failures never reach the service.

use std::future::Future;
use std::pin::Pin;

use crate::error::NotesResult;
use crate::models::{BlockKind, ContentBlock, Note, NoteDetail, NotePage};
use crate::notion::{NotesQuery, NotesService};
use crate::validation::{
    normalize_cursor, validate_new_note, validate_note_id, validate_search_query, MAX_PAGE_SIZE,
};

/// Message returned after a successful delete
pub const DELETED_MESSAGE: &str = "Note deleted successfully";

/// Notes operations bound to one external service
pub struct NotesApi<S> {
    service: S,
    default_page_size: u32,
}

impl<S: NotesService> NotesApi<S> {
    pub fn new(service: S, default_page_size: u32) -> Self {
        Self {
            service,
            default_page_size: default_page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// One page of notes, most recently edited first.
    ///
    /// An empty cursor starts from the beginning.
    pub async fn list_notes(&self, cursor: Option<&str>, page_size: Option<u32>) -> NotesResult<NotePage> {
        let query = NotesQuery {
            start_cursor: normalize_cursor(cursor).map(String::from),
            page_size: Some(page_size.unwrap_or(self.default_page_size).clamp(1, MAX_PAGE_SIZE)),
            title_contains: None,
        };

        let response = self.service.query_notes(query).await?;
        Ok(NotePage {
            results: response.results.into_iter().map(Note::from).collect(),
            next_cursor: response.next_cursor,
            has_more: response.has_more,
        })
    }

    /// A note's metadata and its top-level blocks.
    pub async fn get_note(&self, id: Option<&str>) -> NotesResult<NoteDetail> {
        let id = validate_note_id(id)?;

        let page = self.service.retrieve_page(id).await?;
        let blocks = self.service.list_block_children(id, None).await?;

        Ok(NoteDetail {
            page: Note::from(page),
            blocks: blocks.results,
        })
    }

    /// Like [`NotesApi::get_note`], with the children of list items,
    /// toggles and quotes fetched and attached, following child cursors
    /// to the end.
    pub async fn get_note_tree(&self, id: Option<&str>) -> NotesResult<NoteDetail> {
        let id = validate_note_id(id)?;

        let page = self.service.retrieve_page(id).await?;
        let top_level = list_all_children(&self.service, id).await?;
        let blocks = attach_children(&self.service, top_level).await?;

        Ok(NoteDetail {
            page: Note::from(page),
            blocks,
        })
    }

    /// Create a note with a title and one plain paragraph of content.
    pub async fn create_note(&self, title: &str, content: &str) -> NotesResult<Note> {
        validate_new_note(title, content)?;
        let page = self.service.create_page(title, content).await?;
        Ok(Note::from(page))
    }

    /// Archive a note. The record stays in the external store.
    pub async fn delete_note(&self, id: Option<&str>) -> NotesResult<&'static str> {
        let id = validate_note_id(id)?;
        self.service.archive_page(id).await?;
        Ok(DELETED_MESSAGE)
    }

    /// Notes whose title contains `query`. Case handling is the service's.
    pub async fn search_notes(&self, query: &str) -> NotesResult<Vec<Note>> {
        let query = validate_search_query(query)?;

        let response = self
            .service
            .query_notes(NotesQuery {
                start_cursor: None,
                page_size: None,
                title_contains: Some(query.to_string()),
            })
            .await?;

        Ok(response.results.into_iter().map(Note::from).collect())
    }
}

async fn list_all_children<S: NotesService>(service: &S, block_id: &str) -> NotesResult<Vec<ContentBlock>> {
    let mut blocks = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let response = service.list_block_children(block_id, cursor.as_deref()).await?;
        blocks.extend(response.results);

        match response.next_cursor {
            Some(next) if response.has_more => cursor = Some(next),
            _ => break,
        }
    }

    Ok(blocks)
}

/// Block kinds whose children are rendered inside them. Child pages,
/// child databases and synced blocks keep their children unresolved.
fn renders_children(kind: &BlockKind) -> bool {
    matches!(
        kind,
        BlockKind::BulletedListItem(_) | BlockKind::NumberedListItem(_) | BlockKind::Toggle(_) | BlockKind::Quote(_)
    )
}

type BlocksFuture<'a> = Pin<Box<dyn Future<Output = NotesResult<Vec<ContentBlock>>> + Send + 'a>>;

fn attach_children<'a, S: NotesService>(service: &'a S, blocks: Vec<ContentBlock>) -> BlocksFuture<'a> {
    Box::pin(async move {
        let mut resolved = Vec::with_capacity(blocks.len());
        for mut block in blocks {
            if block.has_children && block.children.is_empty() && renders_children(&block.kind) {
                let children = list_all_children(service, &block.id).await?;
                block.children = attach_children(service, children).await?;
            }
            resolved.push(block);
        }
        Ok(resolved)
    })
}

/// In-memory [`NotesService`] used by tests across the crate
#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::error::NotesError;
    use crate::models::{BlockKind, BlockParent, NotionPage, RichTextSpan, TextBlock};
    use crate::notion::ListResponse;

    #[derive(Default)]
    pub struct FakeService {
        pages: Mutex<Vec<NotionPage>>,
        blocks: Mutex<HashMap<String, Vec<ContentBlock>>>,
        pub calls: AtomicUsize,
        pub child_page_size: Option<usize>,
        pub fail_with: Mutex<Option<String>>,
    }

    impl FakeService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn fail_next(&self, message: &str) {
            *self.fail_with.lock().unwrap() = Some(message.to_string());
        }

        /// Add a page whose last-edited time increases with insertion order
        pub fn add_page(&self, title: &str) -> String {
            let mut pages = self.pages.lock().unwrap();
            let id = uuid::Uuid::new_v4().to_string();
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let edited = base + Duration::minutes(pages.len() as i64);
            pages.push(page(&id, title, edited));
            id
        }

        pub fn set_children(&self, parent_id: &str, children: Vec<ContentBlock>) {
            self.blocks
                .lock()
                .unwrap()
                .insert(parent_id.to_string(), children);
        }

        fn check(&self) -> NotesResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with.lock().unwrap().take() {
                Some(message) => Err(NotesError::External {
                    status: Some(400),
                    code: Some("validation_error".to_string()),
                    message,
                }),
                None => Ok(()),
            }
        }

        fn not_found(id: &str) -> NotesError {
            NotesError::External {
                status: Some(404),
                code: Some("object_not_found".to_string()),
                message: format!("Could not find page with ID: {}.", id),
            }
        }
    }

    pub fn page(id: &str, title: &str, edited: chrono::DateTime<Utc>) -> NotionPage {
        serde_json::from_value(json!({
            "id": id,
            "created_time": edited.to_rfc3339(),
            "last_edited_time": edited.to_rfc3339(),
            "archived": false,
            "properties": {
                "Name": { "id": "title", "type": "title", "title": [
                    { "type": "text", "text": { "content": title }, "plain_text": title }
                ]}
            }
        }))
        .unwrap()
    }

    pub fn paragraph(id: &str, parent: &str, text: &str) -> ContentBlock {
        ContentBlock::new(
            id,
            Some(BlockParent::PageId { page_id: parent.to_string() }),
            BlockKind::Paragraph(TextBlock::new(vec![RichTextSpan::plain(text)])),
        )
    }

    impl NotesService for FakeService {
        async fn query_notes(&self, query: NotesQuery) -> NotesResult<ListResponse<NotionPage>> {
            self.check()?;
            let mut pages: Vec<NotionPage> = self
                .pages
                .lock()
                .unwrap()
                .iter()
                .filter(|p| !p.archived)
                .filter(|p| match &query.title_contains {
                    Some(needle) => p.title().contains(needle.as_str()),
                    None => true,
                })
                .cloned()
                .collect();
            pages.sort_by(|a, b| b.last_edited_time.cmp(&a.last_edited_time));

            let start: usize = query
                .start_cursor
                .as_deref()
                .and_then(|c| c.parse().ok())
                .unwrap_or(0);
            let size = query.page_size.unwrap_or(100) as usize;
            let end = (start + size).min(pages.len());
            let has_more = end < pages.len();

            Ok(ListResponse {
                results: pages.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
                next_cursor: has_more.then(|| end.to_string()),
                has_more,
            })
        }

        async fn retrieve_page(&self, page_id: &str) -> NotesResult<NotionPage> {
            self.check()?;
            self.pages
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == page_id)
                .cloned()
                .ok_or_else(|| Self::not_found(page_id))
        }

        async fn list_block_children(
            &self,
            block_id: &str,
            start_cursor: Option<&str>,
        ) -> NotesResult<ListResponse<ContentBlock>> {
            self.check()?;
            let all = self
                .blocks
                .lock()
                .unwrap()
                .get(block_id)
                .cloned()
                .unwrap_or_default();

            let start: usize = start_cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
            let size = self.child_page_size.unwrap_or(100);
            let end = (start + size).min(all.len());
            let has_more = end < all.len();

            Ok(ListResponse {
                results: all[start..end].to_vec(),
                next_cursor: has_more.then(|| end.to_string()),
                has_more,
            })
        }

        async fn create_page(&self, title: &str, content: &str) -> NotesResult<NotionPage> {
            self.check()?;
            let id = self.add_page(title);
            self.set_children(&id, vec![paragraph(&format!("{}-b0", id), &id, content)]);
            self.retrieve_page(&id).await
        }

        async fn archive_page(&self, page_id: &str) -> NotesResult<NotionPage> {
            self.check()?;
            let mut pages = self.pages.lock().unwrap();
            let page = pages
                .iter_mut()
                .find(|p| p.id == page_id)
                .ok_or_else(|| Self::not_found(page_id))?;
            page.archived = true;
            Ok(page.clone())
        }
    }
}
