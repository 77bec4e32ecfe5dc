//! sm-core: Shared types, traits, and utilities for strong-motion processing
//!
//! This crate provides the foundational types used across all sm crates:
//! data-type selectors, baseline orders, processing status, time windows,
//! the common error type, processing configuration and the source record
//! collaborator interface.

mod config;
mod error;
mod record;
mod time;
mod types;

pub use config::*;
pub use error::*;
pub use record::*;
pub use time::*;
pub use types::*;

/// Type alias for waveform samples (always f64)
pub type Sample = f64;
