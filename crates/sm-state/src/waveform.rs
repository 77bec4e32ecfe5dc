//! Per-channel waveform state
//!
//! `WaveformState` carries ACC, VEL and DIS for one channel together with
//! the correction history and the processing status. ACC is authoritative;
//! after every mutation VEL and DIS are re-derived before the call returns.

use serde::{Deserialize, Serialize};
use sm_core::{
    DataType, ProcessingConfig, ProcessingStatus, Sample, SmError, SmResult, SourceRecord,
    check_bounds, nyquist, record_duration,
};
use sm_dsp::{estimate_event_onset, integrate};

use crate::BaselineStep;

/// Processing state of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformState {
    pub(crate) channel_id: String,
    pub(crate) source_path: String,
    pub(crate) delta_t: f64,
    pub(crate) event_onset: f64,
    pub(crate) acc: Vec<Sample>,
    pub(crate) vel: Vec<Sample>,
    pub(crate) dis: Vec<Sample>,
    pub(crate) low_corner: f64,
    pub(crate) high_corner: f64,
    pub(crate) steps: Vec<BaselineStep>,
    pub(crate) status: ProcessingStatus,
    pub(crate) corrected_count: u32,
    pub(crate) filtered_count: u32,
    pub(crate) differential_order: usize,
}

impl WaveformState {
    /// Fresh state from a source record, at status RESET.
    ///
    /// Filter corners start at the configured defaults (clamped to Nyquist).
    /// Without an explicit `onset` the strong-motion estimate is used.
    ///
    /// # Errors
    ///
    /// [`SmError::SourceUnavailable`] for an empty record,
    /// [`SmError::InvalidParameter`] for a bad config or sampling interval,
    /// [`SmError::OutOfBounds`] for an onset outside the record.
    pub fn create(
        record: &dyn SourceRecord,
        config: &ProcessingConfig,
        onset: Option<f64>,
    ) -> SmResult<Self> {
        config.validate()?;
        let dt = record.delta_t();
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SmError::InvalidParameter(format!(
                "delta_t must be positive, got {dt}"
            )));
        }
        if record.is_empty() {
            return Err(SmError::SourceUnavailable(format!(
                "{} has no samples",
                record.channel_code()
            )));
        }

        let duration = record_duration(record.len(), dt);
        let event_onset = match onset {
            Some(t) => {
                check_bounds("event_onset", t, 0.0, duration)?;
                t
            }
            None => estimate_event_onset(
                record.samples(),
                dt,
                config.strong_motion_threshold_pct,
                config.event_onset_offset,
            ),
        };

        let nyq = nyquist(dt);
        let high_corner = config.high_corner_default.min(nyq);
        let low_corner = config.low_corner_default.min(high_corner);

        let mut state = Self {
            channel_id: record.channel_code().to_string(),
            source_path: record.source_path().to_string(),
            delta_t: dt,
            event_onset,
            acc: record.samples().to_vec(),
            vel: Vec::new(),
            dis: Vec::new(),
            low_corner,
            high_corner,
            steps: Vec::new(),
            status: ProcessingStatus::Reset,
            corrected_count: 0,
            filtered_count: 0,
            differential_order: config.differential_order,
        };
        state.derive_from_acc();

        log::debug!(
            "Created state for {} ({} samples, dt {}, onset {:.3}s)",
            state.channel_id,
            state.len(),
            dt,
            event_onset
        );
        Ok(state)
    }

    /// Rebuild ACC from the source and clear all processing history.
    ///
    /// Onset and filter corners are operator settings and are kept.
    ///
    /// # Errors
    ///
    /// [`SmError::SourceUnavailable`] if `record` is not this channel's
    /// source or has no samples.
    pub fn reset_to(&mut self, record: &dyn SourceRecord) -> SmResult<()> {
        if record.channel_code() != self.channel_id || record.delta_t() != self.delta_t {
            return Err(SmError::SourceUnavailable(format!(
                "{} is not the source of channel {}",
                record.channel_code(),
                self.channel_id
            )));
        }
        if record.is_empty() {
            return Err(SmError::SourceUnavailable(format!(
                "{} has no samples",
                record.channel_code()
            )));
        }

        self.acc = record.samples().to_vec();
        self.event_onset = self.event_onset.min(self.duration());
        self.steps.clear();
        self.status = ProcessingStatus::Reset;
        self.corrected_count = 0;
        self.filtered_count = 0;
        self.derive_from_acc();

        log::info!("Reset channel {}", self.channel_id);
        Ok(())
    }

    /// Re-derive VEL and DIS from ACC
    pub(crate) fn derive_from_acc(&mut self) {
        self.vel = integrate(&self.acc, self.delta_t, self.event_onset);
        self.dis = integrate(&self.vel, self.delta_t, self.event_onset);
    }

    /// Move the integration anchor. VEL and DIS follow when it changes.
    ///
    /// # Errors
    ///
    /// [`SmError::OutOfBounds`] outside `[0, duration]`; state is unchanged.
    pub fn set_event_onset(&mut self, onset: f64) -> SmResult<()> {
        check_bounds("event_onset", onset, 0.0, self.duration())?;
        if onset != self.event_onset {
            self.event_onset = onset;
            self.derive_from_acc();
        }
        Ok(())
    }

    /// Record a cosmetic operation
    pub(crate) fn mark_edited(&mut self) {
        if self.status == ProcessingStatus::Reset {
            self.status = ProcessingStatus::Edit;
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    pub fn event_onset(&self) -> f64 {
        self.event_onset
    }

    pub fn len(&self) -> usize {
        self.acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// Record length in seconds (`n * dt`)
    pub fn duration(&self) -> f64 {
        record_duration(self.acc.len(), self.delta_t)
    }

    pub fn nyquist(&self) -> f64 {
        nyquist(self.delta_t)
    }

    pub fn acc(&self) -> &[Sample] {
        &self.acc
    }

    pub fn vel(&self) -> &[Sample] {
        &self.vel
    }

    pub fn dis(&self) -> &[Sample] {
        &self.dis
    }

    /// Trace of the given type
    pub fn trace(&self, data_type: DataType) -> &[Sample] {
        match data_type {
            DataType::Acc => &self.acc,
            DataType::Vel => &self.vel,
            DataType::Dis => &self.dis,
        }
    }

    /// (low, high) filter corners in Hz
    pub fn filter_corners(&self) -> (f64, f64) {
        (self.low_corner, self.high_corner)
    }

    pub fn correction_steps(&self) -> &[BaselineStep] {
        &self.steps
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn corrected_count(&self) -> u32 {
        self.corrected_count
    }

    pub fn filtered_count(&self) -> u32 {
        self.filtered_count
    }

    pub fn differential_order(&self) -> usize {
        self.differential_order
    }
}
