//! sm-batch: Batch processing for strong-motion stations
//!
//! Features:
//! - Parallel processing across channels (never within one)
//! - Background worker with result hand-back and cancellation
//! - JSON source records and JSON products
//! - Station manifests

pub mod config;
pub mod error;
pub mod io;
pub mod job;
pub mod pipeline;
pub mod worker;

pub use config::*;
pub use error::*;
pub use io::*;
pub use job::*;
pub use pipeline::*;
pub use worker::*;
