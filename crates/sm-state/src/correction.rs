//! Baseline correction of a waveform
//!
//! Fitting never touches the state. Previews work on a scratch copy and
//! leave the log untouched. Commits subtract the trend, append the step and
//! bump the counter together, after every parameter has been validated.

use serde::{Deserialize, Serialize};
use sm_core::{
    BaselineOrder, DataType, ProcessingStatus, Sample, SmError, SmResult, TimeWindow,
};
use sm_dsp::{differentiate, fit_baseline, integrate, subtract_in_window};

use crate::{BaselineStep, WaveformState, propagate};

/// Parameters of a single baseline correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    /// Trace the trend is fit on (ACC or VEL)
    pub data_type: DataType,
    pub order: BaselineOrder,
    /// Samples used for the fit
    pub fit: TimeWindow,
    /// Samples the trend is subtracted from
    pub app: TimeWindow,
}

impl CorrectionRequest {
    pub fn new(data_type: DataType, order: BaselineOrder, fit: TimeWindow, app: TimeWindow) -> Self {
        Self {
            data_type,
            order,
            fit,
            app,
        }
    }
}

impl WaveformState {
    /// Fit the requested trend on the current trace, over the whole record.
    ///
    /// # Errors
    ///
    /// [`SmError::OutOfBounds`] for windows outside the record,
    /// [`SmError::InvalidParameter`] for an order the trace does not accept,
    /// [`SmError::InsufficientSamples`] for a fit window too narrow.
    pub fn fit_correction(
        &self,
        request: &CorrectionRequest,
        knot_spacing: f64,
    ) -> SmResult<Vec<Sample>> {
        self.validate_correction(request)?;
        fit_baseline(
            self.trace(request.data_type),
            self.delta_t,
            request.fit,
            request.order,
            knot_spacing,
        )
    }

    /// Scratch copy with `fitted` subtracted. `self` is not modified and no
    /// step, counter or status change is recorded anywhere.
    pub fn preview_correction(
        &self,
        request: &CorrectionRequest,
        fitted: &[Sample],
    ) -> SmResult<WaveformState> {
        self.validate_correction(request)?;
        self.validate_fitted(fitted)?;
        let mut scratch = self.clone();
        scratch.subtract_trend(request.data_type, fitted, request.app);
        Ok(scratch)
    }

    /// Subtract `fitted` and record the step.
    ///
    /// Status becomes CORRECTED, including from FILTERED: a correction
    /// after filtering invalidates the filtered result.
    pub fn commit_correction(
        &mut self,
        request: &CorrectionRequest,
        fitted: &[Sample],
    ) -> SmResult<&BaselineStep> {
        self.validate_correction(request)?;
        self.validate_fitted(fitted)?;
        let step = BaselineStep::resolve(
            request.data_type,
            request.order,
            request.fit,
            request.app,
            self.steps.len(),
        )?;

        self.subtract_trend(request.data_type, fitted, request.app);
        self.corrected_count += 1;
        self.status = ProcessingStatus::Corrected;

        log::debug!(
            "{}: committed {} {} correction #{} (final {} on {})",
            self.channel_id,
            request.data_type,
            request.order,
            self.corrected_count,
            step.order_final(),
            step.target_type_final()
        );

        self.steps.push(step);
        let index = self.steps.len() - 1;
        Ok(&self.steps[index])
    }

    /// Fit and commit in one call
    pub fn correct(
        &mut self,
        request: &CorrectionRequest,
        knot_spacing: f64,
    ) -> SmResult<&BaselineStep> {
        let fitted = self.fit_correction(request, knot_spacing)?;
        self.commit_correction(request, &fitted)
    }

    fn validate_correction(&self, request: &CorrectionRequest) -> SmResult<()> {
        let duration = self.duration();
        request.fit.validate("fit_start", "fit_stop", duration)?;
        request.app.validate("app_start", "app_stop", duration)?;
        propagate(request.data_type, request.order)?;
        Ok(())
    }

    fn validate_fitted(&self, fitted: &[Sample]) -> SmResult<()> {
        if fitted.len() != self.len() {
            return Err(SmError::InvalidParameter(format!(
                "fitted trend has {} samples, trace has {}",
                fitted.len(),
                self.len()
            )));
        }
        Ok(())
    }

    /// Array update shared by preview and commit
    fn subtract_trend(&mut self, data_type: DataType, fitted: &[Sample], app: TimeWindow) {
        let dt = self.delta_t;
        match data_type {
            DataType::Vel => {
                // ACC is corrected by the derivative of the trend, starting
                // from the current ACC rather than differentiating VEL.
                let slope = differentiate(fitted, dt, self.differential_order);
                subtract_in_window(&mut self.acc, &slope, dt, app);
                subtract_in_window(&mut self.vel, fitted, dt, app);
                self.dis = integrate(&self.vel, dt, self.event_onset);
            }
            _ => {
                subtract_in_window(&mut self.acc, fitted, dt, app);
                self.derive_from_acc();
            }
        }
    }
}
