//! Block renderer.
//!
//! Turns a note's content blocks into a tree of [`RenderNode`]s. Rendering
//! is total: every input block yields exactly one node, in input order,
//! and unknown block types become visible placeholders.
//!
//! Numbered list items are numbered per parent container. The counters live
//! in a [`ListNumbering`] owned by a single render pass and threaded through
//! the recursion, so sibling lists under different parents never interfere.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Annotations, BlockKind, ContentBlock, RichTextSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

/// Presentation of one span, derived only from its annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineStyle {
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub line_through: bool,
    pub underline: bool,
    pub monospace: bool,
    /// Foreground color; `None` for the service's default color
    pub color: Option<String>,
}

impl From<&Annotations> for InlineStyle {
    fn from(a: &Annotations) -> Self {
        Self {
            font_weight: if a.bold { FontWeight::Bold } else { FontWeight::Normal },
            font_style: if a.italic { FontStyle::Italic } else { FontStyle::Normal },
            line_through: a.strikethrough,
            underline: a.underline,
            monospace: a.code,
            color: a.color().map(String::from),
        }
    }
}

impl InlineStyle {
    pub fn is_plain(&self) -> bool {
        self.font_weight == FontWeight::Normal
            && self.font_style == FontStyle::Normal
            && !self.line_through
            && !self.underline
            && !self.monospace
            && self.color.is_none()
    }
}

/// A styled run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineSpan {
    pub text: String,
    pub style: InlineStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl From<&RichTextSpan> for InlineSpan {
    fn from(span: &RichTextSpan) -> Self {
        Self {
            text: span.content().to_string(),
            style: InlineStyle::from(&span.annotations),
            href: span.href.clone(),
        }
    }
}

/// Renderable form of one content block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RenderNode {
    Paragraph {
        id: String,
        spans: Vec<InlineSpan>,
    },
    Heading {
        id: String,
        level: u8,
        spans: Vec<InlineSpan>,
    },
    /// A single-item bulleted list
    BulletedItem {
        id: String,
        spans: Vec<InlineSpan>,
        children: Vec<RenderNode>,
    },
    /// A single-item numbered list starting at `number`
    NumberedItem {
        id: String,
        number: u32,
        spans: Vec<InlineSpan>,
        children: Vec<RenderNode>,
    },
    Image {
        id: String,
        url: Option<String>,
    },
    /// Collapsible section
    Toggle {
        id: String,
        summary: Vec<InlineSpan>,
        children: Vec<RenderNode>,
    },
    Quote {
        id: String,
        spans: Vec<InlineSpan>,
        children: Vec<RenderNode>,
    },
    Code {
        id: String,
        language: String,
        spans: Vec<InlineSpan>,
    },
    /// Visible placeholder for a block type this renderer does not know
    Unsupported {
        id: String,
        type_name: String,
    },
}

impl RenderNode {
    pub fn id(&self) -> &str {
        match self {
            RenderNode::Paragraph { id, .. }
            | RenderNode::Heading { id, .. }
            | RenderNode::BulletedItem { id, .. }
            | RenderNode::NumberedItem { id, .. }
            | RenderNode::Image { id, .. }
            | RenderNode::Toggle { id, .. }
            | RenderNode::Quote { id, .. }
            | RenderNode::Code { id, .. }
            | RenderNode::Unsupported { id, .. } => id,
        }
    }

    /// Nested nodes, empty for leaf types
    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::BulletedItem { children, .. }
            | RenderNode::NumberedItem { children, .. }
            | RenderNode::Toggle { children, .. }
            | RenderNode::Quote { children, .. } => children,
            _ => &[],
        }
    }
}

/// Per-parent counters for numbered list items
#[derive(Debug, Default)]
pub struct ListNumbering {
    counters: HashMap<String, u32>,
}

impl ListNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number for the next item under `parent_id`: 1 on first use, then +1 each call.
    pub fn next(&mut self, parent_id: &str) -> u32 {
        let counter = self.counters.entry(parent_id.to_string()).or_insert(1);
        let number = *counter;
        *counter += 1;
        number
    }
}

/// Render a block sequence with fresh numbering.
pub fn render_blocks(blocks: &[ContentBlock]) -> Vec<RenderNode> {
    let mut numbering = ListNumbering::new();
    render_with(blocks, None, &mut numbering)
}

/// Render a block sequence, continuing the given numbering.
///
/// `container_id` identifies the block or page holding `blocks`; it is
/// used as the numbering key for blocks that carry no parent reference.
pub fn render_with(
    blocks: &[ContentBlock],
    container_id: Option<&str>,
    numbering: &mut ListNumbering,
) -> Vec<RenderNode> {
    blocks
        .iter()
        .map(|block| render_block(block, container_id, numbering))
        .collect()
}

fn spans(rich_text: &[RichTextSpan]) -> Vec<InlineSpan> {
    rich_text.iter().map(InlineSpan::from).collect()
}

fn render_children(block: &ContentBlock, numbering: &mut ListNumbering) -> Vec<RenderNode> {
    if block.has_children && !block.children.is_empty() {
        render_with(&block.children, Some(&block.id), numbering)
    } else {
        Vec::new()
    }
}

fn render_block(
    block: &ContentBlock,
    container_id: Option<&str>,
    numbering: &mut ListNumbering,
) -> RenderNode {
    let id = block.id.clone();

    match &block.kind {
        BlockKind::Paragraph(text) => RenderNode::Paragraph {
            id,
            spans: spans(&text.rich_text),
        },
        BlockKind::Heading1(text) => RenderNode::Heading {
            id,
            level: 1,
            spans: spans(&text.rich_text),
        },
        BlockKind::Heading2(text) => RenderNode::Heading {
            id,
            level: 2,
            spans: spans(&text.rich_text),
        },
        BlockKind::Heading3(text) => RenderNode::Heading {
            id,
            level: 3,
            spans: spans(&text.rich_text),
        },
        BlockKind::BulletedListItem(text) => RenderNode::BulletedItem {
            id,
            spans: spans(&text.rich_text),
            children: render_children(block, numbering),
        },
        BlockKind::NumberedListItem(text) => {
            let parent_key = block.parent_id().or(container_id).unwrap_or_default();
            // Take the number before descending so nested items cannot shift it
            let number = numbering.next(parent_key);
            RenderNode::NumberedItem {
                id,
                number,
                spans: spans(&text.rich_text),
                children: render_children(block, numbering),
            }
        }
        BlockKind::Image(image) => RenderNode::Image {
            id,
            url: image.url().map(String::from),
        },
        BlockKind::Toggle(text) => RenderNode::Toggle {
            id,
            summary: spans(&text.rich_text),
            children: render_children(block, numbering),
        },
        BlockKind::Quote(text) => RenderNode::Quote {
            id,
            spans: spans(&text.rich_text),
            children: render_children(block, numbering),
        },
        BlockKind::Code(code) => RenderNode::Code {
            id,
            language: code.language.clone(),
            spans: spans(&code.rich_text),
        },
        BlockKind::Unsupported { type_name, .. } => {
            tracing::debug!("Rendering placeholder for unsupported block type {}", type_name);
            RenderNode::Unsupported {
                id,
                type_name: type_name.clone(),
            }
        }
    }
}
