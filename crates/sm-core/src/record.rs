//! Source record collaborator interface
//!
//! The processing core never parses on-disk waveform formats. It reads an
//! immutable record through [`SourceRecord`]; concrete readers implement
//! [`RecordReader`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::{Sample, SmError, SmResult};

/// Immutable uncorrected record of one instrument channel
pub trait SourceRecord: Send + Sync {
    /// Instrument channel code
    fn channel_code(&self) -> &str;

    /// Where the record was read from
    fn source_path(&self) -> &str;

    /// Sampling interval in seconds
    fn delta_t(&self) -> f64;

    /// Record start time as written by the instrument
    fn start_time(&self) -> &str;

    /// Raw acceleration samples
    fn samples(&self) -> &[Sample];

    /// Free-text comment lines
    fn comment_lines(&self) -> &[String];

    fn len(&self) -> usize {
        self.samples().len()
    }

    fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }
}

/// Loads source records by path
pub trait RecordReader: Send + Sync {
    fn read(&self, path: &Path) -> SmResult<Arc<dyn SourceRecord>>;
}

/// Source record held in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InMemoryRecord {
    pub channel: String,
    #[serde(default)]
    pub source_path: String,
    pub delta_t: f64,
    #[serde(default)]
    pub start_time: String,
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub comments: Vec<String>,
}

impl InMemoryRecord {
    pub fn new(channel: impl Into<String>, delta_t: f64, samples: Vec<Sample>) -> SmResult<Self> {
        let record = Self {
            channel: channel.into(),
            source_path: String::new(),
            delta_t,
            start_time: String::new(),
            samples,
            comments: Vec::new(),
        };
        record.validate()?;
        Ok(record)
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = start_time.into();
        self
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    /// Sampling interval must be positive and the trace non-empty
    pub fn validate(&self) -> SmResult<()> {
        if !(self.delta_t.is_finite() && self.delta_t > 0.0) {
            return Err(SmError::InvalidParameter(format!(
                "delta_t must be positive, got {}",
                self.delta_t
            )));
        }
        if self.samples.is_empty() {
            return Err(SmError::SourceUnavailable(format!(
                "record {} has no samples",
                self.channel
            )));
        }
        if self.samples.iter().any(|s| !s.is_finite()) {
            return Err(SmError::SourceUnavailable(format!(
                "record {} contains non-finite samples",
                self.channel
            )));
        }
        Ok(())
    }

    pub fn into_shared(self) -> Arc<dyn SourceRecord> {
        Arc::new(self)
    }
}

impl SourceRecord for InMemoryRecord {
    fn channel_code(&self) -> &str {
        &self.channel
    }

    fn source_path(&self) -> &str {
        &self.source_path
    }

    fn delta_t(&self) -> f64 {
        self.delta_t
    }

    fn start_time(&self) -> &str {
        &self.start_time
    }

    fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn comment_lines(&self) -> &[String] {
        &self.comments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_dt() {
        assert!(matches!(
            InMemoryRecord::new("HNZ", 0.0, vec![0.0; 10]),
            Err(SmError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_empty_record() {
        assert!(matches!(
            InMemoryRecord::new("HNZ", 0.01, Vec::new()),
            Err(SmError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_trait_accessors() {
        let record = InMemoryRecord::new("HNE", 0.005, vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_source_path("/data/ci.abc.hne.v0")
            .into_shared();
        assert_eq!(record.channel_code(), "HNE");
        assert_eq!(record.len(), 3);
        assert_eq!(record.source_path(), "/data/ci.abc.hne.v0");
    }
}
