//! The search backend seam.
//!
//! [`SearchBackend`] is the set of RPCs the catalog needs from a document
//! search service. [`opensearch::OpenSearchClient`] implements it over HTTP;
//! tests substitute an in-memory implementation.

pub mod opensearch;

use crate::error::BackendError;
use crate::search::Query;
use async_trait::async_trait;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use opensearch::OpenSearchClient;

/// How a document write treats an existing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Index under a backend-assigned handle. Never conflicts.
    Index,
    /// Create under the given handle, failing with
    /// [`BackendError::DocumentExists`] if it is taken.
    CreateIfAbsent(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort on one field: `{"<field>": {"order": "desc"}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

impl Serialize for SortField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Order {
            order: SortOrder,
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &Order { order: self.order })?;
        map.end()
    }
}

/// Body of a search RPC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: Query,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortField>,
    pub size: usize,
    /// Ask for an exact total instead of the backend's default cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_total_hits: Option<bool>,
}

impl SearchRequest {
    pub const fn new(query: Query, size: usize) -> Self {
        Self {
            query,
            sort: Vec::new(),
            size,
            track_total_hits: None,
        }
    }

    #[must_use]
    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    #[must_use]
    pub const fn track_total_hits(mut self) -> Self {
        self.track_total_hits = Some(true);
        self
    }
}

/// Body of a search RPC response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    pub hits: Hits,
}

impl SearchResponse {
    /// Total number of matching documents, independent of `size`.
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map_or(0, |t| t.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    #[serde(default)]
    pub relation: Option<String>,
}

/// A single matching document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hit {
    /// Backend document handle.
    #[serde(rename = "_id")]
    pub id: String,
    /// Stored document payload. Absent when the backend was told not to
    /// return it or the document has none.
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

/// RPCs the catalog issues against a document search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Check whether the named index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError>;

    /// Create the named index with the given settings and mappings body.
    async fn create_index(&self, index: &str, body: &Value) -> Result<(), BackendError>;

    /// Write a document and return its backend handle.
    async fn index_document(
        &self,
        index: &str,
        document: &Value,
        op: WriteOp,
    ) -> Result<String, BackendError>;

    /// Delete a document by backend handle. A missing document is not an error.
    async fn delete_document(&self, index: &str, handle: &str) -> Result<(), BackendError>;

    /// Run a search.
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, BackendError>;
}
