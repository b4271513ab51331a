use comparely_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    FileNotFound(std::path::PathBuf),

    #[error("invalid device: {0}")]
    Invalid(#[from] ValidationError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
