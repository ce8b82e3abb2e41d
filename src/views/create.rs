//! Create-note form state.

use serde::{Deserialize, Serialize};

use crate::models::Note;
use crate::validation::{validate_new_note, MSG_TITLE_AND_CONTENT_REQUIRED};

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct CreateForm {
    pub title: String,
    pub content: String,
    submitting: bool,
    error: Option<String>,
}

impl CreateForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Start submitting. Refuses, without any request, while a submit is
    /// pending or when a field is empty.
    pub fn begin_submit(&mut self) -> Option<NewNote> {
        if self.submitting {
            return None;
        }
        if validate_new_note(&self.title, &self.content).is_err() {
            self.error = Some(MSG_TITLE_AND_CONTENT_REQUIRED.to_string());
            return None;
        }

        self.submitting = true;
        self.error = None;
        Some(NewNote {
            title: self.title.clone(),
            content: self.content.clone(),
        })
    }

    /// Path of the created note's page
    pub fn submit_succeeded(&mut self, note: &Note) -> String {
        self.submitting = false;
        format!("/notes/{}", urlencoding::encode(&note.id))
    }

    pub fn submit_failed(&mut self, message: &str) {
        self.submitting = false;
        self.error = Some(format!("Failed to create note: {}", message));
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
