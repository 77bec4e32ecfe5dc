//! Bandpass filtering of a waveform

use sm_core::{ProcessingConfig, ProcessingStatus, SmResult, check_bounds};
use sm_dsp::{BandpassFilter, cosine_taper};

use crate::WaveformState;

impl WaveformState {
    /// Taper and bandpass ACC, then re-derive VEL and DIS anchored at
    /// `onset`.
    ///
    /// Corners and onset are stored on the state, `filtered_count` is
    /// incremented and status becomes FILTERED.
    ///
    /// # Errors
    ///
    /// [`sm_core::SmError::OutOfBounds`] unless
    /// `0 <= low <= high <= Nyquist` and `onset` lies inside the record.
    /// The state is unchanged on error.
    pub fn apply_filter(
        &mut self,
        low_corner: f64,
        high_corner: f64,
        onset: f64,
        config: &ProcessingConfig,
    ) -> SmResult<()> {
        check_bounds("event_onset", onset, 0.0, self.duration())?;
        let mut filter =
            BandpassFilter::design(low_corner, high_corner, self.delta_t, config.filter_order)?;

        cosine_taper(&mut self.acc, self.delta_t, config.taper_length);
        filter.apply_zero_phase(&mut self.acc);

        self.low_corner = low_corner;
        self.high_corner = high_corner;
        self.event_onset = onset;
        self.derive_from_acc();
        self.filtered_count += 1;
        self.status = ProcessingStatus::Filtered;

        log::debug!(
            "{}: filtered {:.4}-{:.4} Hz (#{})",
            self.channel_id,
            low_corner,
            high_corner,
            self.filtered_count
        );
        Ok(())
    }
}
