//! Error handling types for catalog operations.

use thiserror::Error;

/// A specialized Result type for snippet catalog operations.
pub type Result<T> = std::result::Result<T, SnippetError>;

/// Errors surfaced by [`SnippetStore`](crate::store::SnippetStore) and
/// [`SnippetService`](crate::service::SnippetService).
#[derive(Debug, Error)]
pub enum SnippetError {
    /// A snippet with this `$id` already exists.
    #[error("a snippet with $id '{0}' already exists")]
    Conflict(String),

    /// No stored snippet carries this `$id`.
    #[error("snippet with $id '{0}' not found")]
    NotFound(String),

    /// The submitted document could not be turned into a snippet.
    #[error("invalid snippet: {0}")]
    InvalidInput(String),

    /// The search backend failed or could not be reached.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SnippetError {
    /// Whether the caller can correct this condition (conflict, not-found,
    /// invalid input). Backend failures are opaque server-side errors.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}

/// Errors raised while talking to the search backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network-level error during HTTP communication.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("request to search backend timed out")]
    Timeout,

    /// Index creation was rejected because the index is already there.
    #[error("index '{0}' already exists")]
    IndexAlreadyExists(String),

    /// Create-if-absent write was rejected because the document exists.
    #[error("document '{0}' already exists")]
    DocumentExists(String),

    /// The backend answered with a non-success status.
    #[error("search backend error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend answered with a body we could not understand.
    #[error("invalid response from search backend: {0}")]
    InvalidResponse(String),

    /// The configured backend URL cannot address index endpoints.
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}
