//! One-sided Fourier amplitude spectrum

use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;
use sm_core::{Sample, SmError, SmResult};

/// Amplitude spectrum sampled at positive frequencies (DC excluded)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmplitudeSpectrum {
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

impl AmplitudeSpectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// (frequency, amplitude) pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.amplitudes.iter().copied())
    }

    /// Frequency spacing in Hz
    pub fn resolution(&self) -> f64 {
        self.frequencies.first().copied().unwrap_or(0.0)
    }

    /// Frequency of the largest amplitude
    pub fn peak_frequency(&self) -> Option<f64> {
        self.iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(f, _)| f)
    }
}

/// Fourier amplitude spectrum of `samples` with sampling interval `dt`.
///
/// The trace is zero-padded to the next power of two `M`; bins `1..=M/2`
/// are returned with frequency `k / (M * dt)` and amplitude `|X_k| * dt`.
pub fn amplitude_spectrum(samples: &[Sample], dt: f64) -> SmResult<AmplitudeSpectrum> {
    let fft_size = samples.len().next_power_of_two();
    if samples.is_empty() || fft_size < 2 {
        return Ok(AmplitudeSpectrum::default());
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_size);

    let mut input = fft.make_input_vec();
    input[..samples.len()].copy_from_slice(samples);
    let mut output: Vec<Complex<f64>> = fft.make_output_vec();

    fft.process(&mut input, &mut output)
        .map_err(|e| SmError::InvalidParameter(format!("FFT failed: {e}")))?;

    let df = 1.0 / (fft_size as f64 * dt);
    let bins = fft_size / 2;
    let mut spectrum = AmplitudeSpectrum {
        frequencies: Vec::with_capacity(bins),
        amplitudes: Vec::with_capacity(bins),
    };
    for (k, c) in output.iter().enumerate().take(bins + 1).skip(1) {
        spectrum.frequencies.push(k as f64 * df);
        spectrum.amplitudes.push(c.norm() * dt);
    }

    log::debug!(
        "Amplitude spectrum: {} samples padded to {}, {} bins",
        samples.len(),
        fft_size,
        bins
    );

    Ok(spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_bin_layout() {
        let spectrum = amplitude_spectrum(&vec![0.0; 1000], 0.01).unwrap();
        assert_eq!(spectrum.len(), 512);
        assert_abs_diff_eq!(spectrum.resolution(), 100.0 / 1024.0, epsilon = 1e-12);
        assert_abs_diff_eq!(*spectrum.frequencies.last().unwrap(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sine_peak() {
        let dt = 0.01;
        // 12.5 Hz lands exactly on bin 128 of a 1024-point transform
        let samples: Vec<f64> = (0..1024)
            .map(|i| (2.0 * PI * 12.5 * i as f64 * dt).sin())
            .collect();
        let spectrum = amplitude_spectrum(&samples, dt).unwrap();
        assert_abs_diff_eq!(spectrum.peak_frequency().unwrap(), 12.5, epsilon = 1e-9);
        // |X_k| = N/2 for a unit sine on-bin
        assert_abs_diff_eq!(spectrum.amplitudes[127], 512.0 * dt, epsilon = 1e-6);
    }

    #[test]
    fn test_dc_excluded() {
        let spectrum = amplitude_spectrum(&vec![3.0; 64], 0.01).unwrap();
        assert!(spectrum.amplitudes.iter().all(|a| a.abs() < 1e-9));
    }

    #[test]
    fn test_empty_and_single() {
        assert!(amplitude_spectrum(&[], 0.01).unwrap().is_empty());
        assert!(amplitude_spectrum(&[1.0], 0.01).unwrap().is_empty());
    }
}
