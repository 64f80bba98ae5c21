//! Index provisioning.
//!
//! [`IndexManager::ensure_index`] runs once before the store serves traffic.
//! It never fails: the catalog keeps starting even when the backend is down,
//! and the first real request surfaces the problem instead.

use crate::backend::SearchBackend;
use crate::error::BackendError;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Settings and mappings applied when the index is created.
const INDEX_TEMPLATE: &str = include_str!("../resources/index-template.json");

/// Outcome of [`IndexManager::ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index was already there (possibly created by a concurrent process).
    AlreadyPresent,
    /// This call created the index.
    Created,
    /// The backend could not be reached or refused the request.
    Unavailable,
}

/// Index settings and field mappings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexTemplate {
    pub settings: Value,
    pub mappings: Value,
}

#[derive(Deserialize)]
struct TemplateFile {
    template: IndexTemplate,
}

impl IndexTemplate {
    /// The template bundled with the crate.
    pub fn bundled() -> serde_json::Result<Self> {
        Self::from_json(INDEX_TEMPLATE)
    }

    /// Parse `{"template": {"settings": ..., "mappings": ...}}`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<TemplateFile>(json).map(|file| file.template)
    }

    /// Body of the index creation request.
    pub fn create_body(&self) -> Value {
        json!({
            "settings": self.settings,
            "mappings": self.mappings,
        })
    }
}

/// Ensures the backing index exists with the catalog's mappings.
#[derive(Clone)]
pub struct IndexManager {
    backend: Arc<dyn SearchBackend>,
    index_name: String,
}

impl IndexManager {
    pub fn new(backend: Arc<dyn SearchBackend>, index_name: impl Into<String>) -> Self {
        Self {
            backend,
            index_name: index_name.into(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Create the index from the bundled template unless it already exists.
    ///
    /// Failures are logged and reported as [`IndexStatus::Unavailable`].
    pub async fn ensure_index(&self) -> IndexStatus {
        match self.try_ensure_index().await {
            Ok(status) => {
                match status {
                    IndexStatus::Created => {
                        tracing::info!("Created index '{}'", self.index_name);
                    }
                    _ => tracing::info!("Index '{}' already present", self.index_name),
                }
                status
            }
            Err(e) => {
                tracing::error!("Failed to provision index '{}': {}", self.index_name, e);
                IndexStatus::Unavailable
            }
        }
    }

    async fn try_ensure_index(&self) -> Result<IndexStatus, BackendError> {
        if self.backend.index_exists(&self.index_name).await? {
            return Ok(IndexStatus::AlreadyPresent);
        }

        let template = IndexTemplate::bundled()
            .map_err(|e| BackendError::InvalidResponse(format!("bundled index template: {e}")))?;

        match self
            .backend
            .create_index(&self.index_name, &template.create_body())
            .await
        {
            Ok(()) => Ok(IndexStatus::Created),
            // Another process won the race between our check and create
            Err(BackendError::IndexAlreadyExists(_)) => {
                tracing::debug!("Index '{}' created concurrently", self.index_name);
                Ok(IndexStatus::AlreadyPresent)
            }
            Err(e) => Err(e),
        }
    }
}
