//! Search query construction.
//!
//! [`QueryBuilder`] turns free text into a disjunctive backend query that
//! combines fuzzy full-text matching, substring wildcards and synonym
//! expansion. The [`Query`] tree serializes to the backend's JSON query DSL.

use crate::search::synonyms::{SynonymTable, normalize};
use crate::snippet::field;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::sync::Arc;

/// Edit distance allowed by the fuzzy clause.
pub const FUZZINESS: &str = "2";
/// Leading characters that must match literally before fuzz applies.
pub const PREFIX_LENGTH: u32 = 2;
/// At least one `should` clause has to match.
pub const MINIMUM_SHOULD_MATCH: &str = "1";

/// Fields searched by the full-text clauses.
const TEXT_FIELDS: [&str; 2] = [field::TITLE, field::DESCRIPTION];

/// A backend query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    MatchAll {},
    Bool(BoolQuery),
    MultiMatch(MultiMatchQuery),
    Wildcard(WildcardQuery),
    Term(TermQuery),
}

impl Query {
    /// Query matching every document.
    pub const fn match_all() -> Self {
        Self::MatchAll {}
    }

    /// Check if this is a match-all query.
    pub const fn is_match_all(&self) -> bool {
        matches!(self, Self::MatchAll {})
    }
}

/// Boolean combination of clauses. Only the `should` arm is used here.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<String>,
}

/// Fuzzy full-text match across several fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMatchQuery {
    pub query: String,
    pub fields: Vec<String>,
    pub fuzziness: String,
    pub fuzzy_transpositions: bool,
    pub prefix_length: u32,
}

/// Wildcard pattern on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct WildcardQuery {
    pub field: String,
    pub value: String,
}

/// Exact, unanalyzed value on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    pub field: String,
    pub value: String,
}

/// `{"<field>": {"value": "<value>"}}`
fn serialize_field_value<S: Serializer>(
    serializer: S,
    field: &str,
    value: &str,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Value<'a> {
        value: &'a str,
    }

    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(field, &Value { value })?;
    map.end()
}

impl Serialize for WildcardQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_field_value(serializer, &self.field, &self.value)
    }
}

impl Serialize for TermQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_field_value(serializer, &self.field, &self.value)
    }
}

/// Builds backend queries for snippet search and id lookup.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    synonyms: Arc<SynonymTable>,
}

impl QueryBuilder {
    /// Create a builder that expands queries with the given synonym table.
    pub const fn new(synonyms: Arc<SynonymTable>) -> Self {
        Self { synonyms }
    }

    /// Build the search query for free text.
    ///
    /// Blank or missing text matches everything. Otherwise the query is a
    /// `bool` of `should` clauses (at least one must match):
    /// - fuzzy `multi_match` on title and description
    /// - `*text*` wildcard on title
    /// - `*text*` wildcard on description
    /// - the same three clauses for every synonym of the text
    pub fn build_search_query(&self, text: Option<&str>) -> Query {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Query::match_all();
        };

        let mut should = Vec::new();
        push_term_clauses(&mut should, text);

        // Single-character text is searched but never expanded
        let original = normalize(text);
        for synonym in self.synonyms.synonyms_for(text) {
            if original.as_deref() != Some(synonym.as_str()) {
                push_term_clauses(&mut should, &synonym);
            }
        }

        tracing::trace!("Built search query for '{}' with {} clauses", text, should.len());

        Query::Bool(BoolQuery {
            should,
            minimum_should_match: Some(MINIMUM_SHOULD_MATCH.to_string()),
        })
    }

    /// Build the exact-match query for a logical `$id`.
    ///
    /// Targets the keyword subfield so identifiers are never tokenized.
    pub fn build_id_query(&self, id: &str) -> Query {
        Query::Term(TermQuery {
            field: field::ID_KEYWORD.to_string(),
            value: id.to_string(),
        })
    }
}

/// Append the fuzzy and wildcard clauses for one term.
fn push_term_clauses(should: &mut Vec<Query>, term: &str) {
    should.push(Query::MultiMatch(MultiMatchQuery {
        query: term.to_string(),
        fields: TEXT_FIELDS.iter().map(|f| (*f).to_string()).collect(),
        fuzziness: FUZZINESS.to_string(),
        fuzzy_transpositions: true,
        prefix_length: PREFIX_LENGTH,
    }));

    let pattern = format!("*{}*", term.to_lowercase());
    for field in TEXT_FIELDS {
        should.push(Query::Wildcard(WildcardQuery {
            field: field.to_string(),
            value: pattern.clone(),
        }));
    }
}
