//! Synonym table for query expansion.
//!
//! The table maps a canonical term to an ordered list of related terms. It is
//! loaded once at startup and shared read-only (`Arc<SynonymTable>`) with the
//! query builder. Being any member of a group pulls in the whole group.

use ahash::AHashMap;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Synonym table bundled with the crate.
const BUNDLED_SYNONYMS: &str = include_str!("../../resources/synonym-map.json");

/// Terms shorter than this are not expanded.
const MIN_TERM_LENGTH: usize = 2;

/// Immutable term → synonyms table with a precomputed reverse index.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    /// canonical term → synonyms, as loaded
    entries: AHashMap<String, Vec<String>>,
    /// synonym → canonical terms listing it
    reverse: AHashMap<String, Vec<String>>,
}

impl SynonymTable {
    /// Build a table from canonical term → synonym list pairs.
    pub fn new(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let entries: AHashMap<String, Vec<String>> = entries.into_iter().collect();

        let mut reverse: AHashMap<String, Vec<String>> = AHashMap::new();
        for (key, values) in &entries {
            for value in values {
                reverse.entry(value.clone()).or_default().push(key.clone());
            }
        }

        Self { entries, reverse }
    }

    /// An empty table. Expansion returns only the normalized term.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a table from its JSON form (`{"term": ["synonym", ...]}`).
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let entries: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// The table bundled with the crate.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_SYNONYMS).unwrap_or_else(|e| {
            tracing::warn!("Bundled synonym table is malformed, using empty table: {}", e);
            Self::empty()
        })
    }

    /// Load the synonym table for this process.
    ///
    /// Reads `path` when given, falling back to the bundled table if the file
    /// is missing or malformed. Never fails: a missing table only disables
    /// expansion.
    pub fn load(path: Option<&Path>) -> Self {
        let table = match path {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                    tracing::warn!(
                        "Failed to parse synonym file {}, using bundled table: {}",
                        path.display(),
                        e
                    );
                    Self::bundled()
                }),
                Err(e) => {
                    tracing::warn!(
                        "Synonym file {} not readable, using bundled table: {}",
                        path.display(),
                        e
                    );
                    Self::bundled()
                }
            },
            None => Self::bundled(),
        };

        tracing::info!("Loaded {} synonym entries", table.len());
        table
    }

    /// Number of canonical terms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand a term into itself plus every term sharing a synonym group with it.
    ///
    /// The term is trimmed and lower-cased first. Terms shorter than two
    /// characters yield an empty set. Lookup is exact on the whole term; a
    /// multi-word query is looked up as one phrase.
    pub fn synonyms_for(&self, term: &str) -> BTreeSet<String> {
        let Some(term) = normalize(term) else {
            return BTreeSet::new();
        };

        let mut result = BTreeSet::new();

        if let Some(synonyms) = self.entries.get(&term) {
            result.extend(synonyms.iter().cloned());
        }

        if let Some(keys) = self.reverse.get(&term) {
            for key in keys {
                result.insert(key.clone());
                if let Some(group) = self.entries.get(key) {
                    result.extend(group.iter().cloned());
                }
            }
        }

        result.insert(term);
        result
    }
}

/// Trim and lower-case a query term. Returns `None` when the result is too
/// short to be worth expanding.
pub(crate) fn normalize(term: &str) -> Option<String> {
    let normalized = term.trim().to_lowercase();
    if normalized.chars().count() < MIN_TERM_LENGTH {
        None
    } else {
        Some(normalized)
    }
}
