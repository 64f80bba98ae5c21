//! The catalog entity and its wire representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names shared by the index mapping, the query builder and the store.
pub mod field {
    pub const ID: &str = "$id";
    pub const ID_KEYWORD: &str = "$id.keyword";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const SOURCE: &str = "source";
    pub const CREATED_AT: &str = "createdAt";
}

/// Schema definitions carried by a snippet.
///
/// Submitted documents use either a structured object or an opaque string.
/// The catalog never looks inside; it only needs to hand the same shape back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definitions {
    Object(Map<String, Value>),
    Text(String),
}

/// A reusable JSON-Schema snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,

    #[serde(rename = "$defs", default, skip_serializing_if = "Option::is_none")]
    pub defs: Option<Definitions>,

    /// Required when reading; a stored document without it is unreadable.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Verbatim submitted document. Write-once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl Snippet {
    /// Create an empty snippet stamped with the current time.
    pub fn new() -> Self {
        Self {
            id: None,
            schema_uri: None,
            title: None,
            description: None,
            definitions: None,
            defs: None,
            created_at: Utc::now(),
            source: None,
        }
    }

    /// Set the logical `$id`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The original document text, if attached.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Attach the original document text. A snippet keeps the first source it
    /// was given; later calls are ignored and return `false`.
    pub fn attach_source(&mut self, raw: impl Into<String>) -> bool {
        if self.source.is_some() {
            return false;
        }
        self.source = Some(raw.into());
        true
    }

    /// Copy of this snippet without the original document text, as returned
    /// to listing and search callers.
    #[must_use]
    pub fn without_source(&self) -> Self {
        Self {
            source: None,
            ..self.clone()
        }
    }
}

impl Default for Snippet {
    fn default() -> Self {
        Self::new()
    }
}
