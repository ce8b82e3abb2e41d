//! Single note view state.

use crate::models::{Note, NoteDetail};
use crate::renderer::{render_blocks, RenderNode};

pub const MSG_DETAIL_FAILED: &str = "Failed to fetch note details.";

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loading,
    Loaded { note: Note, nodes: Vec<RenderNode> },
    Errored(String),
}

impl DetailView {
    /// Render a fetched note. Blocks are rendered once, here.
    pub fn loaded(detail: NoteDetail) -> Self {
        let nodes = render_blocks(&detail.blocks);
        DetailView::Loaded {
            note: detail.page,
            nodes,
        }
    }

    pub fn errored(message: impl Into<String>) -> Self {
        DetailView::Errored(message.into())
    }

    pub fn note(&self) -> Option<&Note> {
        match self {
            DetailView::Loaded { note, .. } => Some(note),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockKind, BlockParent, ContentBlock, RichTextSpan, TextBlock};
    use chrono::Utc;

    #[test]
    fn test_loaded_renders_blocks() {
        let note = Note {
            id: "p".to_string(),
            title: "Hello".to_string(),
            created_time: Utc::now(),
            last_edited_time: Utc::now(),
            archived: false,
            url: None,
        };
        let block = ContentBlock::new(
            "b",
            Some(BlockParent::PageId { page_id: "p".to_string() }),
            BlockKind::Paragraph(TextBlock::new(vec![RichTextSpan::plain("hi")])),
        );

        let view = DetailView::loaded(NoteDetail { page: note, blocks: vec![block] });
        match &view {
            DetailView::Loaded { note, nodes } => {
                assert_eq!(note.title, "Hello");
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].id(), "b");
            }
            other => panic!("expected loaded view, got {:?}", other),
        }
        assert!(view.note().is_some());
        assert!(DetailView::errored(MSG_DETAIL_FAILED).note().is_none());
    }
}
