use thiserror::Error;

/// Errors raised while building instruction trees and their proofs.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong count or format of positional inputs.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// A record does not match its schema.
    #[error("Encoding failed for field {field}: {reason}")]
    Encoding { field: usize, reason: String },

    /// Proof requested for a leaf the tree does not hold.
    #[error("Leaf index {index} is out of bounds for tree with {len} leaves")]
    Index { index: usize, len: usize },

    /// A tree data file does not have the expected shape.
    #[error("Malformed tree data: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn encoding(field: usize, reason: impl Into<String>) -> Self {
        Error::Encoding {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
