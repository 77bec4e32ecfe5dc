//! sm-dsp: Numerical processors for strong-motion traces
//!
//! Pure functions over sample slices; nothing here owns waveform state.
//!
//! ## Modules
//! - `detrend` - Baseline trend fitting (mean, polynomial, smoothing spline) and windowed removal
//! - `spline` - Natural cubic spline used by SPLINE fits
//! - `integrate` - Onset-anchored integration and stencil differentiation
//! - `biquad` - TDF-II second-order sections
//! - `filter` - Zero-phase Butterworth bandpass and end tapers
//! - `onset` - Event-onset estimate from the strong-motion threshold
//! - `spectrum` - One-sided Fourier amplitude spectrum

pub mod biquad;
pub mod detrend;
pub mod filter;
pub mod integrate;
pub mod onset;
pub mod spectrum;
pub mod spline;

pub use detrend::{fit_baseline, subtract_in_window};
pub use filter::{BandpassFilter, cosine_taper};
pub use integrate::{differentiate, integrate};
pub use onset::estimate_event_onset;
pub use spectrum::{AmplitudeSpectrum, amplitude_spectrum};

use sm_core::Sample;

/// Trait for all sample processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
