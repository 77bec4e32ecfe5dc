//! Commit gate and product hand-off
//!
//! Products are irreversible, so they are only written once a channel has
//! been corrected and then filtered the same number of times.

use sm_core::{ProcessingStatus, SmError, SmResult, SourceRecord};
use sm_dsp::{AmplitudeSpectrum, amplitude_spectrum};

use crate::{WaveformState, format_baseline_step};

/// Channel description written alongside the products
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelMetadata {
    pub channel: String,
    pub source_path: String,
    pub start_time: String,
    pub comments: Vec<String>,
}

impl ChannelMetadata {
    pub fn from_record(record: &dyn SourceRecord) -> Self {
        Self {
            channel: record.channel_code().to_string(),
            source_path: record.source_path().to_string(),
            start_time: record.start_time().to_string(),
            comments: record.comment_lines().to_vec(),
        }
    }
}

/// Everything a writer persists for one committed channel
#[derive(Debug, Clone)]
pub struct ProductSet<'a> {
    pub state: &'a WaveformState,
    pub metadata: &'a ChannelMetadata,
    /// Baseline steps in annotation form, in application order
    pub annotations: Vec<String>,
    /// Fourier amplitude spectrum of the final ACC
    pub spectrum: AmplitudeSpectrum,
}

/// Persists derived products.
///
/// Only ever called behind [`CommitGate`]. Returns human-readable log lines.
pub trait ProductWriter: Send + Sync {
    fn write_products(&self, products: &ProductSet<'_>) -> SmResult<Vec<String>>;
}

/// Commit precondition check
pub struct CommitGate;

impl CommitGate {
    /// Status must be FILTERED with as many filters as corrections
    pub fn is_ready(state: &WaveformState) -> bool {
        state.status() == ProcessingStatus::Filtered
            && state.corrected_count() == state.filtered_count()
    }

    /// # Errors
    ///
    /// [`SmError::CommitNotReady`] when [`CommitGate::is_ready`] is false.
    pub fn check(state: &WaveformState) -> SmResult<()> {
        if Self::is_ready(state) {
            Ok(())
        } else {
            Err(SmError::CommitNotReady {
                status: state.status(),
                corrected: state.corrected_count(),
                filtered: state.filtered_count(),
            })
        }
    }

    /// Check the gate, build the product set and hand it to `writer`.
    ///
    /// Nothing is computed or written when the gate is closed.
    pub fn commit(
        state: &WaveformState,
        metadata: &ChannelMetadata,
        writer: &dyn ProductWriter,
    ) -> SmResult<Vec<String>> {
        Self::check(state)?;

        let products = ProductSet {
            state,
            metadata,
            annotations: state
                .correction_steps()
                .iter()
                .map(format_baseline_step)
                .collect(),
            spectrum: amplitude_spectrum(state.acc(), state.delta_t())?,
        };
        let lines = writer.write_products(&products)?;

        log::info!(
            "Committed {} ({} correction steps, {} product lines)",
            metadata.channel,
            products.annotations.len(),
            lines.len()
        );
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CorrectionRequest;
    use sm_core::{BaselineOrder, DataType, InMemoryRecord, ProcessingConfig, TimeWindow};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ProductWriter for RecordingWriter {
        fn write_products(&self, products: &ProductSet<'_>) -> SmResult<Vec<String>> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(products.annotations.clone());
            Ok(vec![format!("wrote {}", products.metadata.channel)])
        }
    }

    fn request() -> CorrectionRequest {
        CorrectionRequest::new(
            DataType::Acc,
            BaselineOrder::Mean,
            TimeWindow::new(0.0, 2.0),
            TimeWindow::new(0.0, 10.0),
        )
    }

    fn setup() -> (WaveformState, ChannelMetadata) {
        let samples = (0..1000).map(|i| 0.05 + (i as f64 * 0.07).sin()).collect();
        let rec = InMemoryRecord::new("HNE", 0.01, samples).unwrap();
        let state = WaveformState::create(&rec, &ProcessingConfig::default(), Some(1.0)).unwrap();
        (state, ChannelMetadata::from_record(&rec))
    }

    #[test]
    fn test_gate_refuses_without_io() {
        let config = ProcessingConfig::default();
        let (mut state, meta) = setup();
        let writer = RecordingWriter::default();

        assert!(CommitGate::commit(&state, &meta, &writer).is_err());

        state.correct(&request(), 1.0).unwrap();
        assert!(CommitGate::commit(&state, &meta, &writer).is_err());

        state.correct(&request(), 1.0).unwrap();
        state.apply_filter(0.1, 25.0, 1.0, &config).unwrap();
        let err = CommitGate::commit(&state, &meta, &writer).unwrap_err();
        assert!(matches!(
            err,
            SmError::CommitNotReady {
                corrected: 2,
                filtered: 1,
                ..
            }
        ));
        assert!(writer.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_gate_accepts_correct_then_filter() {
        let (mut state, meta) = setup();
        let writer = RecordingWriter::default();

        state.correct(&request(), 1.0).unwrap();
        state
            .apply_filter(0.1, 25.0, 1.0, &ProcessingConfig::default())
            .unwrap();
        let lines = CommitGate::commit(&state, &meta, &writer).unwrap();

        assert_eq!(lines, vec!["wrote HNE".to_string()]);
        let calls = writer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert!(calls[0][0].contains("<ABLC>"));
    }

    #[test]
    fn test_filter_without_correction_is_not_ready() {
        let (mut state, _) = setup();
        state
            .apply_filter(0.1, 25.0, 1.0, &ProcessingConfig::default())
            .unwrap();
        assert!(!CommitGate::is_ready(&state));
    }
}
