//! Batch configuration

use serde::{Deserialize, Serialize};
use sm_core::ProcessingConfig;

/// Batch processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of worker threads (0 = auto)
    pub thread_count: usize,

    /// Per-channel processing settings
    pub processing: ProcessingConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            thread_count: 0,
            processing: ProcessingConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Set thread count
    pub fn with_threads(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    pub fn with_processing(mut self, processing: ProcessingConfig) -> Self {
        self.processing = processing;
        self
    }

    /// Threads actually used
    pub fn effective_threads(&self) -> usize {
        if self.thread_count == 0 {
            rayon::current_num_threads()
        } else {
            self.thread_count
        }
    }
}
