//! Input validation for Notion Notes.
//!
//! All validators return NotesError::Validation on failure. Messages are
//! static because they are shown to API callers verbatim.

use crate::error::{NotesError, NotesResult};

/// Upper bound the external service accepts for `page_size`
pub const MAX_PAGE_SIZE: u32 = 100;

/// Limit the external service places on a single rich-text content string
pub const MAX_RICH_TEXT_LENGTH: usize = 2000;

pub const MSG_TITLE_AND_CONTENT_REQUIRED: &str = "Title and content are required";
pub const MSG_NO_ID: &str = "No ID provided";
pub const MSG_SEARCH_QUERY_REQUIRED: &str = "Search query is required";

/// Validate a note identifier is present. Its format is left to the external service.
pub fn validate_note_id(id: Option<&str>) -> NotesResult<&str> {
    match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(NotesError::validation("id", MSG_NO_ID)),
    }
}

/// Validate both fields of a new note are non-empty. Whitespace counts as content.
pub fn validate_new_note(title: &str, content: &str) -> NotesResult<()> {
    if title.is_empty() {
        return Err(NotesError::validation("title", MSG_TITLE_AND_CONTENT_REQUIRED));
    }
    if content.is_empty() {
        return Err(NotesError::validation("content", MSG_TITLE_AND_CONTENT_REQUIRED));
    }
    Ok(())
}

/// Validate a search query is non-empty.
pub fn validate_search_query(query: &str) -> NotesResult<&str> {
    if query.is_empty() {
        return Err(NotesError::validation("searchQuery", MSG_SEARCH_QUERY_REQUIRED));
    }
    Ok(query)
}

/// Resolve a requested page size: unparsable or absent values use
/// `default`, everything else is clamped to `1..=MAX_PAGE_SIZE`.
pub fn resolve_page_size(requested: Option<&str>, default: u32) -> u32 {
    requested
        .and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, MAX_PAGE_SIZE as i64) as u32)
        .unwrap_or_else(|| default.clamp(1, MAX_PAGE_SIZE))
}

/// Treat an empty cursor as "start from the beginning".
pub fn normalize_cursor(cursor: Option<&str>) -> Option<&str> {
    cursor.map(str::trim).filter(|c| !c.is_empty())
}

/// Split text into chunks the external service accepts in one rich-text item.
///
/// Splits on character boundaries, never inside a UTF-8 sequence.
pub fn chunk_rich_text(content: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in content.chars() {
        if count == MAX_RICH_TEXT_LENGTH {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_note_id() {
        assert_eq!(validate_note_id(Some("abc")).unwrap(), "abc");
        assert!(validate_note_id(None).is_err());
        assert!(validate_note_id(Some("")).is_err());
    }

    #[test]
    fn test_validate_note_id_passes_whitespace_through() {
        assert_eq!(validate_note_id(Some("   ")).unwrap(), "   ");
        assert_eq!(validate_note_id(Some(" abc ")).unwrap(), " abc ");
    }

    #[test]
    fn test_validate_note_id_message() {
        let err = validate_note_id(None).unwrap_err();
        assert_eq!(err.to_string(), MSG_NO_ID);
    }

    #[test]
    fn test_validate_new_note() {
        assert!(validate_new_note("Groceries", "milk").is_ok());
        assert!(validate_new_note("", "milk").is_err());
        assert!(validate_new_note("Groceries", "").is_err());

        let err = validate_new_note("", "").unwrap_err();
        assert_eq!(err.to_string(), MSG_TITLE_AND_CONTENT_REQUIRED);
    }

    #[test]
    fn test_validate_new_note_accepts_whitespace_only() {
        assert!(validate_new_note("   ", "milk").is_ok());
        assert!(validate_new_note("Groceries", " \n ").is_ok());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("ocer").unwrap(), "ocer");
        let err = validate_search_query("").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), MSG_SEARCH_QUERY_REQUIRED);
    }

    #[test]
    fn test_resolve_page_size() {
        assert_eq!(resolve_page_size(None, 10), 10);
        assert_eq!(resolve_page_size(Some("25"), 10), 25);
        assert_eq!(resolve_page_size(Some("abc"), 10), 10);
        assert_eq!(resolve_page_size(Some("0"), 10), 1);
        assert_eq!(resolve_page_size(Some("-5"), 10), 1);
        assert_eq!(resolve_page_size(Some("500"), 10), MAX_PAGE_SIZE);
        assert_eq!(resolve_page_size(None, 1000), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_normalize_cursor() {
        assert_eq!(normalize_cursor(None), None);
        assert_eq!(normalize_cursor(Some("")), None);
        assert_eq!(normalize_cursor(Some("c1")), Some("c1"));
    }

    #[test]
    fn test_chunk_rich_text() {
        assert_eq!(chunk_rich_text("short"), vec!["short".to_string()]);

        let long = "é".repeat(MAX_RICH_TEXT_LENGTH + 5);
        let chunks = chunk_rich_text(&long);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), MAX_RICH_TEXT_LENGTH);
        assert_eq!(chunks[1].chars().count(), 5);
        assert_eq!(chunks.concat(), long);

        let exact = "a".repeat(MAX_RICH_TEXT_LENGTH);
        assert_eq!(chunk_rich_text(&exact).len(), 1);
    }
}
