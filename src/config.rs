//! Configuration management for Notion Notes.
//!
//! Configuration is assembled once at process start from, in order of
//! increasing precedence:
//! - built-in defaults
//! - an optional JSON config file
//! - environment variables
//!
//! The resulting [`Config`] has no setters; share it as `Arc<Config>`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NotesError, NotesResult};

pub const ENV_API_KEY: &str = "NOTION_API_KEY";
pub const ENV_DATABASE_ID: &str = "NOTION_DATABASE_ID";
pub const ENV_API_BASE_URL: &str = "NOTION_API_BASE_URL";
pub const ENV_NOTION_VERSION: &str = "NOTION_VERSION";
pub const ENV_TITLE_PROPERTY: &str = "NOTES_TITLE_PROPERTY";
pub const ENV_PAGE_SIZE: &str = "NOTES_PAGE_SIZE";
pub const ENV_REQUEST_TIMEOUT: &str = "NOTES_REQUEST_TIMEOUT_SECS";

/// Raw configuration as stored in the JSON config file
#[derive(Clone, Serialize, Deserialize)]
pub struct ConfigData {
    /// Integration token for the document-database API
    #[serde(default)]
    pub api_key: Option<String>,
    /// Database that holds the notes
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Value sent in the `Notion-Version` header
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
    /// Name of the title-type property written on create
    #[serde(default = "default_title_property")]
    pub title_property: String,
    /// Page size used when the caller does not send one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_title_property() -> String {
    "Name".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            api_base_url: default_api_base_url(),
            notion_version: default_notion_version(),
            title_property: default_title_property(),
            default_page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ConfigData {
    /// Load from a JSON file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> NotesResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overlay values found through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> NotesResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_API_KEY) {
            self.api_key = Some(v);
        }
        if let Some(v) = non_empty(ENV_DATABASE_ID) {
            self.database_id = Some(v);
        }
        if let Some(v) = non_empty(ENV_API_BASE_URL) {
            self.api_base_url = v;
        }
        if let Some(v) = non_empty(ENV_NOTION_VERSION) {
            self.notion_version = v;
        }
        if let Some(v) = non_empty(ENV_TITLE_PROPERTY) {
            self.title_property = v;
        }
        if let Some(v) = non_empty(ENV_PAGE_SIZE) {
            self.default_page_size = v.trim().parse().map_err(|_| {
                NotesError::Config(format!("{} must be a positive integer, got {:?}", ENV_PAGE_SIZE, v))
            })?;
        }
        if let Some(v) = non_empty(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = v.trim().parse().map_err(|_| {
                NotesError::Config(format!(
                    "{} must be a number of seconds, got {:?}",
                    ENV_REQUEST_TIMEOUT, v
                ))
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for ConfigData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigData")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("database_id", &self.database_id)
            .field("api_base_url", &self.api_base_url)
            .field("notion_version", &self.notion_version)
            .field("title_property", &self.title_property)
            .field("default_page_size", &self.default_page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Validated, immutable process configuration
#[derive(Clone)]
pub struct Config {
    api_key: String,
    database_id: String,
    api_base_url: String,
    notion_version: String,
    title_property: String,
    default_page_size: u32,
    request_timeout: Duration,
}

impl Config {
    /// Build the configuration from an optional file plus the process environment.
    pub fn load(config_file: Option<&Path>) -> NotesResult<Self> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit variable lookup.
    pub fn load_with<F>(config_file: Option<&Path>, lookup: F) -> NotesResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut data = match config_file {
            Some(path) => ConfigData::from_file(path).map_err(|e| {
                NotesError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?,
            None => ConfigData::default(),
        };
        data.apply_env(lookup)?;
        Self::from_data(data)
    }

    /// Validate raw data into a usable configuration.
    pub fn from_data(data: ConfigData) -> NotesResult<Self> {
        let api_key = data
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NotesError::Config(format!("{} is not set", ENV_API_KEY)))?;
        let database_id = data
            .database_id
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| NotesError::Config(format!("{} is not set", ENV_DATABASE_ID)))?;

        if data.default_page_size == 0 {
            return Err(NotesError::Config("default_page_size must be at least 1".to_string()));
        }

        Ok(Self {
            api_key,
            database_id,
            api_base_url: data.api_base_url.trim_end_matches('/').to_string(),
            notion_version: data.notion_version,
            title_property: data.title_property,
            default_page_size: data.default_page_size,
            request_timeout: Duration::from_secs(data.request_timeout_secs),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Base URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn notion_version(&self) -> &str {
        &self.notion_version
    }

    pub fn title_property(&self) -> &str {
        &self.title_property
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("api_base_url", &self.api_base_url)
            .field("notion_version", &self.notion_version)
            .field("title_property", &self.title_property)
            .field("default_page_size", &self.default_page_size)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
