//! Batch job definitions

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sm_core::ProcessingConfig;
use sm_state::ScriptedOperation;

use crate::{BatchError, BatchResult};

/// Job identifier (position in the batch)
pub type JobId = usize;

/// Bandpass corners applied after all corrections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterCorners {
    pub low: f64,
    pub high: f64,
}

fn default_true() -> bool {
    true
}

/// Processing plan for one channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelJob {
    #[serde(default)]
    pub id: JobId,

    /// Source record path
    pub record: PathBuf,

    /// Baseline annotations from a previous product, applied first
    #[serde(default)]
    pub annotations: Vec<String>,

    /// Scripted operations, applied after the annotations
    #[serde(default)]
    pub operations: Vec<ScriptedOperation>,

    /// Final filter (None = rely on the operations)
    #[serde(default)]
    pub filter: Option<FilterCorners>,

    /// Write products through the commit gate
    #[serde(default = "default_true")]
    pub commit: bool,
}

impl ChannelJob {
    pub fn new(id: JobId, record: impl Into<PathBuf>) -> Self {
        Self {
            id,
            record: record.into(),
            annotations: Vec::new(),
            operations: Vec::new(),
            filter: None,
            commit: true,
        }
    }

    pub fn with_annotations(mut self, lines: Vec<String>) -> Self {
        self.annotations = lines;
        self
    }

    pub fn with_operations(mut self, operations: Vec<ScriptedOperation>) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_filter(mut self, low: f64, high: f64) -> Self {
        self.filter = Some(FilterCorners { low, high });
        self
    }

    pub fn without_commit(mut self) -> Self {
        self.commit = false;
        self
    }
}

/// A station's worth of jobs, as read from disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchManifest {
    #[serde(default)]
    pub processing: ProcessingConfig,
    pub jobs: Vec<ChannelJob>,
}

impl BatchManifest {
    /// Load a manifest. Job ids are renumbered in order and relative record
    /// paths are resolved against the manifest directory.
    pub fn load<P: AsRef<Path>>(path: P) -> BatchResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BatchError::Manifest(format!("{}: {}", path.display(), e)))?;
        let mut manifest: Self = serde_json::from_str(&content)
            .map_err(|e| BatchError::Manifest(format!("{}: {}", path.display(), e)))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for (index, job) in manifest.jobs.iter_mut().enumerate() {
            job.id = index;
            if job.record.is_relative() {
                job.record = base.join(&job.record);
            }
        }
        Ok(manifest)
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Completed,
    Failed,
    Cancelled,
}

/// Outcome of one channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResult {
    pub job_id: JobId,
    /// Channel code, empty when the record could not be read
    pub channel: String,
    pub status: JobStatus,
    /// Baseline steps in the final state
    pub correction_steps: usize,
    /// Writer log lines (empty without commit)
    pub log_lines: Vec<String>,
    pub duration: Duration,
    pub error: Option<String>,
}

impl ChannelResult {
    pub fn success(
        job_id: JobId,
        channel: String,
        correction_steps: usize,
        log_lines: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            job_id,
            channel,
            status: JobStatus::Completed,
            correction_steps,
            log_lines,
            duration,
            error: None,
        }
    }

    pub fn failure(job_id: JobId, error: String, duration: Duration) -> Self {
        Self {
            job_id,
            channel: String::new(),
            status: JobStatus::Failed,
            correction_steps: 0,
            log_lines: Vec::new(),
            duration,
            error: Some(error),
        }
    }

    pub fn cancelled(job_id: JobId, duration: Duration) -> Self {
        Self {
            job_id,
            channel: String::new(),
            status: JobStatus::Cancelled,
            correction_steps: 0,
            log_lines: Vec::new(),
            duration,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
