//! Free-text search query construction.
//!
//! This module provides the synonym table used for query expansion and the
//! builder that turns search text into a backend query.

pub mod query;
pub mod synonyms;

pub use query::{BoolQuery, MultiMatchQuery, Query, QueryBuilder, TermQuery, WildcardQuery};
pub use synonyms::SynonymTable;
