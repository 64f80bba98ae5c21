pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod search;
pub mod service;
pub mod snippet;
pub mod store;
pub mod tracing;

pub use backend::{OpenSearchClient, SearchBackend};
pub use config::{Config, WriteMode};
pub use error::{BackendError, SnippetError};
pub use index::{IndexManager, IndexStatus};
pub use search::{QueryBuilder, SynonymTable};
pub use service::SnippetService;
pub use snippet::{Definitions, Snippet};
pub use store::{DocumentHandle, SnippetStore};
