use infinity_formats::{FormatError, ResRef};
use thiserror::Error;

use crate::context::ResourceKind;

/// Failures while fetching or decoding a game resource.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("resource {name}.{kind} not found")]
    NotFound { name: ResRef, kind: ResourceKind },

    #[error("no decoder available for {kind} resources")]
    NoDecoder { kind: ResourceKind },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the caller is expected to fall back to a default record.
    pub fn is_missing(&self) -> bool {
        matches!(self, EngineError::NotFound { .. } | EngineError::NoDecoder { .. })
    }
}

/// Catalog state that contradicts itself. Not recoverable.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("symbol table {table} maps index {index} but the catalog only holds {count} entries")]
    ConsistencyViolation {
        table: String,
        index: u32,
        count: usize,
    },
}
