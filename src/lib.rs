//! Notion Notes - a note-taking web application backed by a Notion database.
//!
//! This library provides:
//! - Data models for notes and their content blocks
//! - A client for the Notion API and the notes operations built on it
//! - The block renderer and HTML output
//! - UI state for the list, detail and create views
//! - An HTTP server exposing the JSON API and server-rendered pages
//!
//! # Feature Flags
//!
//! - `server`: Include HTTP server components (axum) and the binary. Not needed by API clients.

pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod html;
pub mod models;
pub mod notes_api;
pub mod notion;
pub mod renderer;
#[cfg(feature = "server")]
pub mod server;
pub mod validation;
pub mod views;

// Re-export commonly used types
pub use config::Config;
pub use error::{NotesError, NotesResult};
pub use models::{ContentBlock, Note, NoteDetail, NotePage};
pub use notes_api::NotesApi;
pub use notion::{NotesService, NotionClient};
pub use renderer::{render_blocks, RenderNode};
