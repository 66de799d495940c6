use thiserror::Error;

/// Per-request query failures. None of them leave the engine unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("query text is empty")]
    EmptyQuery,

    #[error("k must be at least 1")]
    InvalidK,

    #[error("query embedding has dimension {got}, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("failed to embed query: {0}")]
    Embedding(String),
}
