//! DSP Integration Tests
//!
//! Cross-module checks for the numerical processors:
//! - Integration / differentiation round trip
//! - Baseline removal followed by integration
//! - Filtering followed by spectral analysis

use approx::assert_abs_diff_eq;
use sm_core::{BaselineOrder, TimeWindow};
use sm_dsp::{
    BandpassFilter, amplitude_spectrum, differentiate, fit_baseline, integrate, subtract_in_window,
};
use std::f64::consts::PI;

const DT: f64 = 0.005;

/// Generate test sine wave
fn generate_sine(samples: usize, freq: f64, amplitude: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| amplitude * (2.0 * PI * freq * i as f64 * DT).sin())
        .collect()
}

/// Reproducible noise from a simple LCG
fn generate_noise(samples: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..samples)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state as f64 / u64::MAX as f64) * 2.0 - 1.0
        })
        .collect()
}

/// Check signal has no NaN or Infinity
fn is_valid_signal(signal: &[f64]) -> bool {
    signal.iter().all(|x| x.is_finite())
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTEGRATION / DIFFERENTIATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_round_trip_constant() {
    let x = vec![0.75; 500];
    for order in [3, 5, 7, 9] {
        let back = differentiate(&integrate(&x, DT, 0.4), DT, order);
        for v in &back {
            assert_abs_diff_eq!(*v, 0.75, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_round_trip_smooth_signal() {
    let x = generate_sine(4000, 1.5, 2.0);
    let back = differentiate(&integrate(&x, DT, 1.0), DT, 5);

    // Interior: trapezoid + central stencil agree to second order
    for i in 5..3995 {
        assert_abs_diff_eq!(back[i], x[i], epsilon = 2e-3);
    }
    // Edges use a one-sided difference
    assert_abs_diff_eq!(back[0], x[0], epsilon = 0.1);
    assert_abs_diff_eq!(back[3999], x[3999], epsilon = 0.1);
}

#[test]
fn test_onset_anchor_only_shifts_constant() {
    let x = generate_sine(2000, 0.7, 1.0);
    let a = integrate(&x, DT, 0.0);
    let b = integrate(&x, DT, 3.0);
    let shift = a[0] - b[0];
    for (va, vb) in a.iter().zip(&b) {
        assert_abs_diff_eq!(va - vb, shift, epsilon = 1e-12);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BASELINE + INTEGRATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_removing_offset_stops_velocity_drift() {
    let n = 4000;
    let mut acc: Vec<f64> = generate_noise(n, 7).iter().map(|v| v * 0.01 + 0.05).collect();

    let drift_before = integrate(&acc, DT, 0.0)[n - 1].abs();

    let fitted = fit_baseline(&acc, DT, TimeWindow::new(0.0, 20.0), BaselineOrder::Mean, 1.0)
        .unwrap();
    subtract_in_window(&mut acc, &fitted, DT, TimeWindow::full(n, DT));

    let drift_after = integrate(&acc, DT, 0.0)[n - 1].abs();
    assert!(drift_before > 0.9);
    // Only the trapezoid end terms remain
    assert!(drift_after < 1e-3, "residual drift {drift_after}");
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILTER + SPECTRUM
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_filtered_spectrum_keeps_passband_peak() {
    let n = 8192;
    let mut acc: Vec<f64> = generate_sine(n, 3.0, 1.0)
        .iter()
        .zip(generate_sine(n, 60.0, 1.0))
        .map(|(a, b)| a + b)
        .collect();

    let mut filter = BandpassFilter::design(0.1, 25.0, DT, 4).unwrap();
    filter.apply_zero_phase(&mut acc);
    assert!(is_valid_signal(&acc));

    let spectrum = amplitude_spectrum(&acc, DT).unwrap();
    let peak = spectrum.peak_frequency().unwrap();
    assert!((peak - 3.0).abs() < 2.0 * spectrum.resolution(), "peak at {peak}");

    let near = |f: f64| {
        spectrum
            .iter()
            .min_by(|a, b| (a.0 - f).abs().total_cmp(&(b.0 - f).abs()))
            .map(|(_, amp)| amp)
            .unwrap()
    };
    assert!(near(60.0) < 0.01 * near(3.0));
}
