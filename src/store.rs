//! Snippet persistence on top of a [`SearchBackend`].

use crate::backend::{Hit, SearchBackend, SearchRequest, SortField, WriteOp};
use crate::config::{DEFAULT_LIMIT, WriteMode};
use crate::error::{BackendError, Result, SnippetError};
use crate::search::QueryBuilder;
use crate::snippet::{Snippet, field};
use std::sync::Arc;

/// Backend handle of a stored document, distinct from its logical `$id`.
pub type DocumentHandle = String;

/// Longest `$id` usable as a backend document handle, in bytes.
pub const MAX_HANDLE_BYTES: usize = 512;

/// Reads and writes snippets in one backend index.
#[derive(Clone)]
pub struct SnippetStore {
    backend: Arc<dyn SearchBackend>,
    queries: QueryBuilder,
    index_name: String,
    default_limit: usize,
    write_mode: WriteMode,
}

impl SnippetStore {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        queries: QueryBuilder,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            queries,
            index_name: index_name.into(),
            default_limit: DEFAULT_LIMIT,
            write_mode: WriteMode::BestEffort,
        }
    }

    /// Page size used for `limit == 0`. Zero is ignored.
    #[must_use]
    pub const fn with_default_limit(mut self, limit: usize) -> Self {
        if limit > 0 {
            self.default_limit = limit;
        }
        self
    }

    #[must_use]
    pub const fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Store a snippet together with its original document text.
    ///
    /// Returns the backend handle of the new document. In
    /// [`WriteMode::Strict`] a snippet with a `$id` is written
    /// create-if-absent under that id and a duplicate yields
    /// [`SnippetError::Conflict`]. A snippet whose `$id` is missing, blank or
    /// longer than [`MAX_HANDLE_BYTES`] is always indexed.
    pub async fn save(&self, mut snippet: Snippet, raw_source: &str) -> Result<DocumentHandle> {
        snippet.attach_source(raw_source);

        let document = serde_json::to_value(&snippet)
            .map_err(|e| SnippetError::InvalidInput(format!("cannot serialize snippet: {e}")))?;

        let op = match (self.write_mode, &snippet.id) {
            (WriteMode::Strict, Some(id))
                if !id.trim().is_empty() && id.len() <= MAX_HANDLE_BYTES =>
            {
                WriteOp::CreateIfAbsent(id.clone())
            }
            _ => WriteOp::Index,
        };

        let handle = self
            .backend
            .index_document(&self.index_name, &document, op)
            .await
            .map_err(|e| match e {
                BackendError::DocumentExists(id) => SnippetError::Conflict(id),
                other => SnippetError::Backend(other),
            })?;

        tracing::debug!("Indexed snippet {:?} as document {}", snippet.id, handle);
        Ok(handle)
    }

    /// Find the backend handle of the snippet with this `$id`.
    pub async fn resolve(&self, id: &str) -> Result<Option<DocumentHandle>> {
        let request = SearchRequest::new(self.queries.build_id_query(id), 1);
        let response = self.backend.search(&self.index_name, &request).await?;

        let handle = response.hits.hits.into_iter().next().map(|hit| hit.id);
        tracing::debug!("Resolved $id '{}' to {:?}", id, handle);
        Ok(handle)
    }

    /// Delete the snippet with this `$id`.
    ///
    /// Resolves the id first; an unknown id is [`SnippetError::NotFound`] and
    /// no delete is issued. A document that disappears between the two steps
    /// counts as deleted.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let Some(handle) = self.resolve(id).await? else {
            return Err(SnippetError::NotFound(id.to_string()));
        };

        self.backend
            .delete_document(&self.index_name, &handle)
            .await?;
        tracing::debug!("Deleted document {} for $id '{}'", handle, id);
        Ok(())
    }

    /// Search snippets, newest first.
    ///
    /// Blank or missing text lists everything. `limit == 0` uses the default
    /// page size. Returned snippets never carry their source text.
    pub async fn search(&self, text: Option<&str>, limit: usize) -> Result<Vec<Snippet>> {
        let size = if limit == 0 { self.default_limit } else { limit };
        let request = SearchRequest::new(self.queries.build_search_query(text), size)
            .sort_by(SortField::desc(field::CREATED_AT));

        let response = self.backend.search(&self.index_name, &request).await?;
        let hit_count = response.hits.hits.len();
        let snippets: Vec<Snippet> = response
            .hits
            .hits
            .into_iter()
            .filter_map(translate_hit)
            .take(size)
            .collect();

        tracing::debug!(
            "Search {:?} returned {} hits, {} snippets",
            text,
            hit_count,
            snippets.len()
        );
        Ok(snippets)
    }

    /// Check whether a snippet with this `$id` is stored.
    ///
    /// A blank id is never stored and is answered without a backend call.
    pub async fn exists_by_id(&self, id: &str) -> Result<bool> {
        if id.trim().is_empty() {
            return Ok(false);
        }

        let request = SearchRequest::new(self.queries.build_id_query(id), 0).track_total_hits();
        let response = self.backend.search(&self.index_name, &request).await?;
        Ok(response.total() > 0)
    }
}

/// Turn a search hit into a snippet. Hits without a usable payload are
/// dropped.
fn translate_hit(hit: Hit) -> Option<Snippet> {
    let source = hit.source?;
    match serde_json::from_value::<Snippet>(source) {
        Ok(snippet) => Some(snippet.without_source()),
        Err(e) => {
            tracing::warn!("Dropping unreadable document {}: {}", hit.id, e);
            None
        }
    }
}
