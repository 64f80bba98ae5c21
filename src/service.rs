//! Catalog operations exposed to callers.
//!
//! [`SnippetService`] is what a resource layer or the CLI talks to. It takes
//! raw submitted documents and plain search parameters, and answers with
//! snippets or a [`SnippetError`] that classifies the failure.

use crate::error::{Result, SnippetError};
use crate::snippet::{Snippet, field};
use crate::store::SnippetStore;
use chrono::Utc;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct SnippetService {
    store: SnippetStore,
}

impl SnippetService {
    pub const fn new(store: SnippetStore) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &SnippetStore {
        &self.store
    }

    /// Register a snippet from its submitted JSON document.
    ///
    /// The document must be a JSON object. If it carries a `$id` that is
    /// already stored, nothing is written and [`SnippetError::Conflict`] is
    /// returned. The creation timestamp is assigned here; a submitted
    /// `createdAt` is ignored. The returned snippet has no source text.
    pub async fn create(&self, raw_json: &str) -> Result<Snippet> {
        if raw_json.trim().is_empty() {
            return Err(SnippetError::InvalidInput("document is empty".into()));
        }

        let document: Value = serde_json::from_str(raw_json)
            .map_err(|e| SnippetError::InvalidInput(format!("document is not valid JSON: {e}")))?;
        let Value::Object(mut document) = document else {
            return Err(SnippetError::InvalidInput(
                "document must be a JSON object".into(),
            ));
        };
        // both are assigned here, never taken from the caller
        document.remove(field::SOURCE);
        document.insert(field::CREATED_AT.to_string(), json!(Utc::now()));

        if let Some(id) = document.get(field::ID).and_then(Value::as_str)
            && self.store.exists_by_id(id).await?
        {
            return Err(SnippetError::Conflict(id.to_string()));
        }

        let snippet: Snippet = serde_json::from_value(Value::Object(document))
            .map_err(|e| SnippetError::InvalidInput(e.to_string()))?;

        let handle = self.store.save(snippet.clone(), raw_json).await?;
        tracing::info!(
            "Created snippet {} (document {})",
            snippet.id.as_deref().unwrap_or("<no $id>"),
            handle
        );

        Ok(snippet.without_source())
    }

    /// Remove the snippet with this `$id`.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!("Deleted snippet {}", id);
        Ok(())
    }

    /// Search by free text, newest first. `limit == 0` uses the default.
    pub async fn search(&self, text: Option<&str>, limit: usize) -> Result<Vec<Snippet>> {
        self.store.search(text, limit).await
    }
}
