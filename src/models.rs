//! Data models for Notion Notes.
//!
//! Notes and content blocks are owned by the external document database.
//! These types are transient, read-only copies used for one request or one
//! render pass. Block JSON keeps every field it arrived with, so a block
//! serializes back to the shape the external service produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title shown when a page has no title text
pub const UNTITLED: &str = "No title";

/// A page as returned by the external service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotionPage {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl NotionPage {
    /// Plain text of the page's title-type property.
    ///
    /// All title segments are concatenated. Returns an empty string when
    /// the page has no title property or the property is empty.
    pub fn title(&self) -> String {
        let title_items = self
            .properties
            .values()
            .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
            .and_then(|prop| prop.get("title"))
            .and_then(Value::as_array);

        let Some(items) = title_items else {
            return String::new();
        };

        items
            .iter()
            .filter_map(|item| {
                item.get("plain_text")
                    .and_then(Value::as_str)
                    .or_else(|| item.pointer("/text/content").and_then(Value::as_str))
            })
            .collect()
    }
}

/// Represents a note: a page in the notes database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Opaque identifier issued by the external service
    pub id: String,
    pub title: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    /// Archived notes are "deleted" but still exist in the external store
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Note {
    /// Title for display, falling back to [`UNTITLED`]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}

impl From<NotionPage> for Note {
    fn from(page: NotionPage) -> Self {
        let title = page.title();
        Self {
            id: page.id,
            title,
            created_time: page.created_time,
            last_edited_time: page.last_edited_time,
            archived: page.archived,
            url: page.url,
        }
    }
}

/// One page of notes plus the pagination cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePage {
    pub results: Vec<Note>,
    /// Opaque; round-tripped without interpretation
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// A note together with its top-level content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDetail {
    pub page: Note,
    pub blocks: Vec<ContentBlock>,
}

/// What contains a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockParent {
    PageId { page_id: String },
    BlockId { block_id: String },
    DatabaseId { database_id: String },
    #[serde(other)]
    Other,
}

impl BlockParent {
    /// Identifier of the containing block or page
    pub fn container_id(&self) -> Option<&str> {
        match self {
            BlockParent::BlockId { block_id } => Some(block_id),
            BlockParent::PageId { page_id } => Some(page_id),
            BlockParent::DatabaseId { database_id } => Some(database_id),
            BlockParent::Other => None,
        }
    }
}

/// Style flags of a rich-text span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "default".to_string()
}

fn default_span_type() -> String {
    "text".to_string()
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: default_color(),
        }
    }
}

impl Annotations {
    /// Color to apply, or `None` for the service's "default" color
    pub fn color(&self) -> Option<&str> {
        match self.color.as_str() {
            "" | "default" => None,
            color => Some(color),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Value>,
}

/// A run of text with independent style flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextSpan {
    #[serde(rename = "type", default = "default_span_type")]
    pub span_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub plain_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RichTextSpan {
    /// Unstyled text span
    pub fn plain(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            span_type: default_span_type(),
            text: Some(TextContent {
                content: content.clone(),
                link: None,
            }),
            annotations: Annotations::default(),
            plain_text: content,
            href: None,
            extra: Map::new(),
        }
    }

    /// Text content of the span. Mentions and equations only carry `plain_text`.
    pub fn content(&self) -> &str {
        match &self.text {
            Some(text) => &text.content,
            None => &self.plain_text,
        }
    }
}

/// Payload shared by every text-bearing block type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextBlock {
    pub fn new(rich_text: Vec<RichTextSpan>) -> Self {
        Self {
            rich_text,
            extra: Map::new(),
        }
    }

    /// Concatenated plain text of all spans
    pub fn plain_text(&self) -> String {
        self.rich_text.iter().map(RichTextSpan::content).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
    #[serde(default)]
    pub language: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUrl {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<FileUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileUrl>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageBlock {
    /// External URL if present, else the hosted file URL
    pub fn url(&self) -> Option<&str> {
        self.external
            .as_ref()
            .or(self.file.as_ref())
            .map(|f| f.url.as_str())
    }
}

/// Type tag plus the type-specific payload of a block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(TextBlock),
    Heading1(TextBlock),
    Heading2(TextBlock),
    Heading3(TextBlock),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    Image(ImageBlock),
    Toggle(TextBlock),
    Quote(TextBlock),
    Code(CodeBlock),
    /// Any type tag this application does not interpret
    Unsupported {
        type_name: String,
        payload: Option<Value>,
    },
}

impl BlockKind {
    /// The external service's type tag
    pub fn type_name(&self) -> &str {
        match self {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Heading1(_) => "heading_1",
            BlockKind::Heading2(_) => "heading_2",
            BlockKind::Heading3(_) => "heading_3",
            BlockKind::BulletedListItem(_) => "bulleted_list_item",
            BlockKind::NumberedListItem(_) => "numbered_list_item",
            BlockKind::Image(_) => "image",
            BlockKind::Toggle(_) => "toggle",
            BlockKind::Quote(_) => "quote",
            BlockKind::Code(_) => "code",
            BlockKind::Unsupported { type_name, .. } => type_name,
        }
    }

    /// Decode a payload for `type_name`. Never fails: anything that cannot
    /// be interpreted becomes [`BlockKind::Unsupported`].
    pub fn from_payload(type_name: &str, payload: Option<Value>) -> Self {
        fn text(payload: &Option<Value>) -> Option<TextBlock> {
            serde_json::from_value(payload.clone()?).ok()
        }

        let decoded = match type_name {
            "paragraph" => text(&payload).map(BlockKind::Paragraph),
            "heading_1" => text(&payload).map(BlockKind::Heading1),
            "heading_2" => text(&payload).map(BlockKind::Heading2),
            "heading_3" => text(&payload).map(BlockKind::Heading3),
            "bulleted_list_item" => text(&payload).map(BlockKind::BulletedListItem),
            "numbered_list_item" => text(&payload).map(BlockKind::NumberedListItem),
            "toggle" => text(&payload).map(BlockKind::Toggle),
            "quote" => text(&payload).map(BlockKind::Quote),
            "code" => payload
                .clone()
                .and_then(|p| serde_json::from_value(p).ok())
                .map(BlockKind::Code),
            "image" => payload
                .clone()
                .and_then(|p| serde_json::from_value(p).ok())
                .map(BlockKind::Image),
            _ => None,
        };

        decoded.unwrap_or_else(|| {
            tracing::trace!("Treating block type {:?} as unsupported", type_name);
            BlockKind::Unsupported {
                type_name: type_name.to_string(),
                payload,
            }
        })
    }

    fn to_payload(&self) -> Option<Value> {
        let value = match self {
            BlockKind::Paragraph(t)
            | BlockKind::Heading1(t)
            | BlockKind::Heading2(t)
            | BlockKind::Heading3(t)
            | BlockKind::BulletedListItem(t)
            | BlockKind::NumberedListItem(t)
            | BlockKind::Toggle(t)
            | BlockKind::Quote(t) => serde_json::to_value(t),
            BlockKind::Code(c) => serde_json::to_value(c),
            BlockKind::Image(i) => serde_json::to_value(i),
            BlockKind::Unsupported { payload, .. } => return payload.clone(),
        };
        value.ok()
    }
}

/// One node of a note's content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub struct ContentBlock {
    pub id: String,
    pub parent: Option<BlockParent>,
    pub has_children: bool,
    pub kind: BlockKind,
    /// Child blocks, when they have been resolved and attached
    pub children: Vec<ContentBlock>,
    /// Fields not interpreted here (object, timestamps, authors, ...)
    pub extra: Map<String, Value>,
}

impl ContentBlock {
    pub fn new(id: impl Into<String>, parent: Option<BlockParent>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            parent,
            has_children: false,
            kind,
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach resolved children and mark the block as having them
    pub fn with_children(mut self, children: Vec<ContentBlock>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Identifier used to group sibling blocks
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().and_then(BlockParent::container_id)
    }
}

/// Wire shape: `{ "type": "<tag>", "<tag>": { payload }, ... }`
#[derive(Serialize, Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<BlockParent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<ContentBlock>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl From<RawBlock> for ContentBlock {
    fn from(mut raw: RawBlock) -> Self {
        let payload = raw.fields.remove(&raw.block_type);
        Self {
            id: raw.id,
            parent: raw.parent,
            has_children: raw.has_children,
            kind: BlockKind::from_payload(&raw.block_type, payload),
            children: raw.children,
            extra: raw.fields,
        }
    }
}

impl From<ContentBlock> for RawBlock {
    fn from(block: ContentBlock) -> Self {
        let block_type = block.kind.type_name().to_string();
        let mut fields = block.extra;
        if let Some(payload) = block.kind.to_payload() {
            fields.insert(block_type.clone(), payload);
        }
        Self {
            id: block.id,
            block_type,
            has_children: block.has_children,
            parent: block.parent,
            children: block.children,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_json(title: Value) -> Value {
        json!({
            "object": "page",
            "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
            "created_time": "2024-03-01T10:00:00.000Z",
            "last_edited_time": "2024-03-02T12:30:00.000Z",
            "archived": false,
            "url": "https://www.notion.so/Groceries-598337872cf94fdf8782e53db20768a5",
            "properties": {
                "Last edited time": {
                    "id": "abc",
                    "type": "last_edited_time",
                    "last_edited_time": "2024-03-02T12:30:00.000Z"
                },
                "Name": {
                    "id": "title",
                    "type": "title",
                    "title": title
                }
            }
        })
    }

    #[test]
    fn test_page_title_concatenates_segments() {
        let page: NotionPage = serde_json::from_value(page_json(json!([
            { "type": "text", "text": { "content": "Groceries " }, "plain_text": "Groceries " },
            { "type": "text", "text": { "content": "list" }, "plain_text": "list" }
        ])))
        .unwrap();

        assert_eq!(page.title(), "Groceries list");
    }

    #[test]
    fn test_page_title_falls_back_to_text_content() {
        let page: NotionPage = serde_json::from_value(page_json(json!([
            { "type": "text", "text": { "content": "Only content" } }
        ])))
        .unwrap();

        assert_eq!(page.title(), "Only content");
    }

    #[test]
    fn test_note_from_page() {
        let page: NotionPage = serde_json::from_value(page_json(json!([]))).unwrap();
        let note = Note::from(page);

        assert_eq!(note.id, "59833787-2cf9-4fdf-8782-e53db20768a5");
        assert_eq!(note.title, "");
        assert_eq!(note.display_title(), UNTITLED);
        assert_eq!(note.created_time.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert!(!note.archived);
    }

    #[test]
    fn test_parse_paragraph_block() {
        let block: ContentBlock = serde_json::from_value(json!({
            "object": "block",
            "id": "b1",
            "type": "paragraph",
            "has_children": false,
            "parent": { "type": "page_id", "page_id": "p1" },
            "paragraph": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": "Hello", "link": null },
                    "annotations": {
                        "bold": true, "italic": false, "strikethrough": false,
                        "underline": false, "code": false, "color": "red"
                    },
                    "plain_text": "Hello",
                    "href": null
                }],
                "color": "default"
            }
        }))
        .unwrap();

        assert_eq!(block.type_name(), "paragraph");
        assert_eq!(block.parent_id(), Some("p1"));
        match &block.kind {
            BlockKind::Paragraph(text) => {
                assert_eq!(text.plain_text(), "Hello");
                assert!(text.rich_text[0].annotations.bold);
                assert_eq!(text.rich_text[0].annotations.color(), Some("red"));
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
        assert_eq!(block.extra.get("object"), Some(&json!("block")));
    }

    #[test]
    fn test_unknown_type_is_unsupported_and_round_trips() {
        let original = json!({
            "object": "block",
            "id": "b2",
            "type": "table_of_contents",
            "has_children": false,
            "parent": { "type": "block_id", "block_id": "b0" },
            "table_of_contents": { "color": "gray" }
        });
        let block: ContentBlock = serde_json::from_value(original.clone()).unwrap();

        assert!(matches!(
            &block.kind,
            BlockKind::Unsupported { type_name, .. } if type_name == "table_of_contents"
        ));
        assert_eq!(serde_json::to_value(&block).unwrap(), original);
    }

    #[test]
    fn test_malformed_known_type_becomes_unsupported() {
        let block: ContentBlock = serde_json::from_value(json!({
            "id": "b3",
            "type": "paragraph",
            "paragraph": "not an object"
        }))
        .unwrap();

        assert!(matches!(block.kind, BlockKind::Unsupported { .. }));
        assert_eq!(block.type_name(), "paragraph");
        assert!(block.parent.is_none());
    }

    #[test]
    fn test_image_prefers_external_url() {
        let image: ImageBlock = serde_json::from_value(json!({
            "type": "external",
            "external": { "url": "https://example.com/a.png" },
            "file": { "url": "https://files.example.com/b.png", "expiry_time": "2024-01-01T00:00:00.000Z" }
        }))
        .unwrap();
        assert_eq!(image.url(), Some("https://example.com/a.png"));

        let hosted: ImageBlock = serde_json::from_value(json!({
            "type": "file",
            "file": { "url": "https://files.example.com/b.png" }
        }))
        .unwrap();
        assert_eq!(hosted.url(), Some("https://files.example.com/b.png"));
    }

    #[test]
    fn test_unknown_parent_type() {
        let parent: BlockParent =
            serde_json::from_value(json!({ "type": "workspace", "workspace": true })).unwrap();
        assert_eq!(parent, BlockParent::Other);
        assert_eq!(parent.container_id(), None);
    }

    #[test]
    fn test_span_content_without_text_uses_plain_text() {
        let span: RichTextSpan = serde_json::from_value(json!({
            "type": "equation",
            "equation": { "expression": "e=mc^2" },
            "plain_text": "e=mc^2"
        }))
        .unwrap();
        assert_eq!(span.content(), "e=mc^2");
        assert!(span.extra.contains_key("equation"));
        assert_eq!(span.annotations, Annotations::default());
    }
}
