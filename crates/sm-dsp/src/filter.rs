//! Zero-phase Butterworth bandpass
//!
//! The bandpass is a cascade of Butterworth high-pass sections at the low
//! corner and low-pass sections at the high corner. Records are processed
//! forward and then backward so the result has no phase shift, which keeps
//! the event onset in place for the integration anchor.

use std::f64::consts::PI;

use sm_core::{Sample, SmError, SmResult, check_bounds, nyquist};

use crate::biquad::{BiquadCoeffs, BiquadTDF2};
use crate::{MonoProcessor, Processor};

/// Butterworth bandpass built from second-order sections
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<BiquadTDF2>,
    low_corner: f64,
    high_corner: f64,
    order: usize,
}

impl BandpassFilter {
    /// Design a bandpass for sampling interval `dt`.
    ///
    /// `order` is the Butterworth order per band edge and must be even.
    /// A zero low corner omits the high-pass; a high corner at Nyquist omits
    /// the low-pass.
    ///
    /// # Errors
    ///
    /// [`SmError::OutOfBounds`] unless `0 <= low <= high <= Nyquist`.
    pub fn design(low_corner: f64, high_corner: f64, dt: f64, order: usize) -> SmResult<Self> {
        let nyq = nyquist(dt);
        check_bounds("low_corner", low_corner, 0.0, nyq)?;
        check_bounds("high_corner", high_corner, low_corner, nyq)?;
        if order == 0 || order % 2 != 0 {
            return Err(SmError::InvalidParameter(format!(
                "filter order must be even and positive, got {order}"
            )));
        }

        let sample_rate = 1.0 / dt;
        let qs = butterworth_qs(order);
        let mut sections = Vec::with_capacity(qs.len() * 2);

        if low_corner > 0.0 {
            sections.extend(
                qs.iter()
                    .map(|&q| BiquadTDF2::with_coeffs(BiquadCoeffs::highpass(low_corner, q, sample_rate))),
            );
        }
        if high_corner < nyq {
            sections.extend(
                qs.iter()
                    .map(|&q| BiquadTDF2::with_coeffs(BiquadCoeffs::lowpass(high_corner, q, sample_rate))),
            );
        }

        log::debug!(
            "Designed bandpass {:.4}-{:.4} Hz, order {}, {} sections",
            low_corner,
            high_corner,
            order,
            sections.len()
        );

        Ok(Self {
            sections,
            low_corner,
            high_corner,
            order,
        })
    }

    pub fn corners(&self) -> (f64, f64) {
        (self.low_corner, self.high_corner)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Run the cascade once, front to back
    fn run(&mut self, buffer: &mut [Sample]) {
        for section in &mut self.sections {
            section.reset();
            section.process_block(buffer);
        }
    }

    /// Filter forward, then backward (zero phase)
    pub fn apply_zero_phase(&mut self, buffer: &mut [Sample]) {
        if self.sections.is_empty() || buffer.is_empty() {
            return;
        }
        self.run(buffer);
        buffer.reverse();
        self.run(buffer);
        buffer.reverse();
    }
}

/// Section Q values of an even-order Butterworth prototype
fn butterworth_qs(order: usize) -> Vec<f64> {
    (0..order / 2)
        .map(|k| {
            let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
            1.0 / (2.0 * theta.cos())
        })
        .collect()
}

/// Apply a raised-cosine taper of `taper_length` seconds to both ends
pub fn cosine_taper(buffer: &mut [Sample], dt: f64, taper_length: f64) {
    let n = buffer.len();
    let m = ((taper_length / dt).round() as usize).min(n / 2);
    if m == 0 {
        return;
    }
    for i in 0..m {
        let w = 0.5 * (1.0 - (PI * i as f64 / m as f64).cos());
        buffer[i] *= w;
        buffer[n - 1 - i] *= w;
    }
}
