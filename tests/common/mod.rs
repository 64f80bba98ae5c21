//! Shared test fixtures and utilities for integration tests.
//!
//! # In-memory backend
//!
//! [`MemoryBackend`] implements [`SearchBackend`] over a `Vec` of documents
//! and records every call it receives, so tests can assert both on results
//! and on which RPCs were (or were not) issued.
//!
//! Query evaluation is deliberately simple:
//! - `match_all` matches everything
//! - `term` compares the field (minus a `.keyword` suffix) exactly
//! - `wildcard` and `multi_match` are case-insensitive substring matches
//! - `bool` matches if any `should` clause matches
//!
//! Sorting honours `createdAt` descending, which is the only sort the catalog
//! issues.
//!
//! # Available Fixtures
//!
//! - `catalog`: best-effort store and service over an empty backend
//! - `strict_catalog`: same, with create-if-absent writes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rstest::fixture;
use serde_json::Value;
use snippet_catalog::backend::{SearchBackend, SearchRequest, SearchResponse, WriteOp};
use snippet_catalog::search::{Query, QueryBuilder, SynonymTable};
use snippet_catalog::{BackendError, SnippetService, SnippetStore, WriteMode};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const INDEX: &str = "snippets";

/// One RPC received by [`MemoryBackend`].
#[allow(dead_code)] // Variants inspected by different integration test crates
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    IndexExists(String),
    CreateIndex { index: String, body: Value },
    IndexDocument { index: String, op: WriteOp },
    DeleteDocument { index: String, handle: String },
    Search { index: String, request: SearchRequest },
}

#[derive(Debug, Clone)]
struct StoredDocument {
    handle: String,
    source: Option<Value>,
}

/// Recording in-memory [`SearchBackend`].
#[derive(Default)]
pub struct MemoryBackend {
    indices: Mutex<HashSet<String>>,
    documents: Mutex<Vec<StoredDocument>>,
    calls: Mutex<Vec<Call>>,
    next_handle: AtomicUsize,
    /// Every call fails with a 503.
    unavailable: AtomicBool,
    /// Index creation loses a race to another process.
    lose_create_race: AtomicBool,
    /// Searches return every match regardless of the requested size.
    ignore_size: AtomicBool,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose index already exists.
    pub fn with_index(index: &str) -> Self {
        let backend = Self::new();
        backend.indices.lock().unwrap().insert(index.to_string());
        backend
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_lose_create_race(&self, lose: bool) {
        self.lose_create_race.store(lose, Ordering::SeqCst);
    }

    pub fn set_ignore_size(&self, ignore: bool) {
        self.ignore_size.store(ignore, Ordering::SeqCst);
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.indices.lock().unwrap().contains(index)
    }

    /// Store a document directly, bypassing the catalog.
    pub fn insert_raw(&self, handle: &str, source: Option<Value>) {
        self.documents.lock().unwrap().push(StoredDocument {
            handle: handle.to_string(),
            source,
        });
    }

    /// Stored payload for a handle.
    pub fn document(&self, handle: &str) -> Option<Value> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|doc| doc.handle == handle)
            .and_then(|doc| doc.source.clone())
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::DeleteDocument { .. }))
            .count()
    }

    pub fn write_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::IndexDocument { .. }))
            .count()
    }

    pub fn search_calls(&self) -> Vec<SearchRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 503,
                message: "cluster unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        self.record(Call::IndexExists(index.to_string()))?;
        Ok(self.has_index(index))
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), BackendError> {
        self.record(Call::CreateIndex {
            index: index.to_string(),
            body: body.clone(),
        })?;

        let mut indices = self.indices.lock().unwrap();
        if self.lose_create_race.load(Ordering::SeqCst) || indices.contains(index) {
            indices.insert(index.to_string());
            return Err(BackendError::IndexAlreadyExists(index.to_string()));
        }
        indices.insert(index.to_string());
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        document: &Value,
        op: WriteOp,
    ) -> Result<String, BackendError> {
        self.record(Call::IndexDocument {
            index: index.to_string(),
            op: op.clone(),
        })?;

        let mut documents = self.documents.lock().unwrap();
        let handle = match op {
            WriteOp::Index => format!("doc-{}", self.next_handle.fetch_add(1, Ordering::SeqCst)),
            WriteOp::CreateIfAbsent(handle) => {
                if documents.iter().any(|doc| doc.handle == handle) {
                    return Err(BackendError::DocumentExists(handle));
                }
                handle
            }
        };
        documents.push(StoredDocument {
            handle: handle.clone(),
            source: Some(document.clone()),
        });
        Ok(handle)
    }

    async fn delete_document(&self, index: &str, handle: &str) -> Result<(), BackendError> {
        self.record(Call::DeleteDocument {
            index: index.to_string(),
            handle: handle.to_string(),
        })?;
        self.documents
            .lock()
            .unwrap()
            .retain(|doc| doc.handle != handle);
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, BackendError> {
        self.record(Call::Search {
            index: index.to_string(),
            request: request.clone(),
        })?;

        let mut matched: Vec<StoredDocument> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|doc| {
                doc.source
                    .as_ref()
                    .map_or(request.query.is_match_all(), |source| matches(&request.query, source))
            })
            .cloned()
            .collect();

        if !request.sort.is_empty() {
            matched.sort_by_key(|doc| std::cmp::Reverse(created_at(doc)));
        }

        let total = matched.len();
        let hits: Vec<Value> = matched
            .into_iter()
            .take(if self.ignore_size.load(Ordering::SeqCst) {
                usize::MAX
            } else {
                request.size
            })
            .map(|doc| match doc.source {
                Some(source) => serde_json::json!({"_id": doc.handle, "_source": source}),
                None => serde_json::json!({"_id": doc.handle}),
            })
            .collect();

        serde_json::from_value(serde_json::json!({
            "hits": {"total": {"value": total, "relation": "eq"}, "hits": hits}
        }))
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

fn created_at(doc: &StoredDocument) -> Option<DateTime<Utc>> {
    doc.source
        .as_ref()?
        .get("createdAt")?
        .as_str()?
        .parse()
        .ok()
}

fn field_text<'a>(source: &'a Value, field: &str) -> Option<&'a str> {
    source.get(field.trim_end_matches(".keyword"))?.as_str()
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn matches(query: &Query, source: &Value) -> bool {
    match query {
        Query::MatchAll {} => true,
        Query::Bool(bool_query) => bool_query.should.iter().any(|q| matches(q, source)),
        Query::Term(term) => field_text(source, &term.field) == Some(term.value.as_str()),
        Query::Wildcard(wildcard) => {
            contains_ci(field_text(source, &wildcard.field), wildcard.value.trim_matches('*'))
        }
        Query::MultiMatch(multi) => multi
            .fields
            .iter()
            .any(|field| contains_ci(field_text(source, field), &multi.query)),
    }
}

/// A store and service over a shared [`MemoryBackend`].
#[allow(dead_code)] // Fields used across different integration test crates
pub struct Catalog {
    pub backend: Arc<MemoryBackend>,
    pub store: SnippetStore,
    pub service: SnippetService,
}

#[allow(dead_code)]
impl Catalog {
    pub fn new(write_mode: WriteMode) -> Self {
        snippet_catalog::tracing::init();

        let backend = Arc::new(MemoryBackend::with_index(INDEX));
        let store = SnippetStore::new(
            Arc::clone(&backend) as Arc<dyn SearchBackend>,
            QueryBuilder::new(Arc::new(SynonymTable::bundled())),
            INDEX,
        )
        .with_write_mode(write_mode);
        let service = SnippetService::new(store.clone());

        Self {
            backend,
            store,
            service,
        }
    }
}

/// Best-effort catalog over an empty backend.
#[allow(dead_code)]
#[fixture]
pub fn catalog() -> Catalog {
    Catalog::new(WriteMode::BestEffort)
}

/// Catalog that writes create-if-absent keyed by `$id`.
#[allow(dead_code)]
#[fixture]
pub fn strict_catalog() -> Catalog {
    Catalog::new(WriteMode::Strict)
}

/// A submitted snippet document.
#[allow(dead_code)]
pub fn document(id: &str, title: &str, description: &str) -> String {
    serde_json::json!({
        "$id": id,
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": title,
        "description": description,
        "definitions": {"value": {"type": "string"}}
    })
    .to_string()
}
