//! Error types for strong-motion processing

use thiserror::Error;

use crate::{BaselineOrder, ProcessingStatus};

/// Core error type
#[derive(Error, Debug)]
pub enum SmError {
    #[error("Insufficient samples for {order} fit: need {required}, window has {available}")]
    InsufficientSamples {
        order: BaselineOrder,
        required: usize,
        available: usize,
    },

    #[error("{parameter} = {value} is outside [{min}, {max}]")]
    OutOfBounds {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(
        "Commit not ready: status {status}, corrected {corrected}, filtered {filtered} \
         (requires FILTERED with equal counts)"
    )]
    CommitNotReady {
        status: ProcessingStatus,
        corrected: u32,
        filtered: u32,
    },

    #[error("Annotation parse error in {line:?}: {reason}")]
    AnnotationParse { line: String, reason: String },

    #[error("Source record unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SmError {
    /// Shorthand for an out-of-bounds error
    pub fn out_of_bounds(parameter: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfBounds {
            parameter,
            value,
            min,
            max,
        }
    }
}

impl From<serde_json::Error> for SmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias
pub type SmResult<T> = Result<T, SmError>;
