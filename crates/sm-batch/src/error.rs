//! Error types for batch processing

use sm_core::SmError;
use thiserror::Error;

/// Batch processing errors
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Processing failed: {0}")]
    Processing(#[from] SmError),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Batch cancelled")]
    Cancelled,

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;
