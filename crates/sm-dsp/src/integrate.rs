//! Integration and differentiation between ACC, VEL and DIS
//!
//! Integration is anchored at the event onset: the pre-event portion of a
//! record is assumed at rest, so the integration constant is chosen to make
//! the integral zero at the onset sample.

use sm_core::{Sample, nearest_index};

/// Central-difference weights for offsets 1..=k, per stencil width
const STENCIL_3: &[f64] = &[1.0 / 2.0];
const STENCIL_5: &[f64] = &[8.0 / 12.0, -1.0 / 12.0];
const STENCIL_7: &[f64] = &[45.0 / 60.0, -9.0 / 60.0, 1.0 / 60.0];
const STENCIL_9: &[f64] = &[672.0 / 840.0, -168.0 / 840.0, 32.0 / 840.0, -3.0 / 840.0];

/// Cumulative trapezoidal integral, shifted to zero at the sample nearest
/// `onset_time`.
pub fn integrate(samples: &[Sample], dt: f64, onset_time: f64) -> Vec<Sample> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(samples.len());
    let mut running = 0.0;
    out.push(running);
    for pair in samples.windows(2) {
        running += 0.5 * (pair[0] + pair[1]) * dt;
        out.push(running);
    }

    let anchor = out[nearest_index(onset_time, dt, samples.len())];
    if anchor != 0.0 {
        for v in &mut out {
            *v -= anchor;
        }
    }
    out
}

/// Numerical derivative using a central stencil of `order` points
/// (3, 5, 7 or 9; other values fall back to 3).
///
/// Near the edges the widest stencil that fits is used; the first and last
/// samples use a one-sided first difference.
pub fn differentiate(samples: &[Sample], dt: f64, order: usize) -> Vec<Sample> {
    let n = samples.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let stencils: &[&[f64]] = match order {
        9 => &[STENCIL_3, STENCIL_5, STENCIL_7, STENCIL_9],
        7 => &[STENCIL_3, STENCIL_5, STENCIL_7],
        5 => &[STENCIL_3, STENCIL_5],
        _ => &[STENCIL_3],
    };
    let max_half = stencils.len();

    (0..n)
        .map(|i| {
            let half = i.min(n - 1 - i).min(max_half);
            if half == 0 {
                return if i == 0 {
                    (samples[1] - samples[0]) / dt
                } else {
                    (samples[n - 1] - samples[n - 2]) / dt
                };
            }
            let weights = stencils[half - 1];
            let sum: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| w * (samples[i + k + 1] - samples[i - k - 1]))
                .sum();
            sum / dt
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_integrate_constant_is_ramp() {
        let out = integrate(&[2.0; 11], 0.1, 0.0);
        assert_abs_diff_eq!(out[0], 0.0);
        assert_abs_diff_eq!(out[10], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_integrate_zero_at_onset() {
        let samples: Vec<f64> = (0..200).map(|i| (i as f64 * 0.05).sin()).collect();
        let out = integrate(&samples, 0.01, 0.7);
        assert_abs_diff_eq!(out[70], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_differentiate_quadratic_interior_exact() {
        let dt = 0.01;
        let samples: Vec<f64> = (0..100).map(|i| (i as f64 * dt).powi(2)).collect();
        for order in [3, 5, 7, 9] {
            let d = differentiate(&samples, dt, order);
            for i in 5..95 {
                assert_abs_diff_eq!(d[i], 2.0 * i as f64 * dt, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_differentiate_edges_one_sided() {
        let d = differentiate(&[0.0, 1.0, 4.0], 1.0, 5);
        assert_eq!(d, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_short_inputs() {
        assert!(differentiate(&[], 0.01, 5).is_empty());
        assert_eq!(differentiate(&[3.0], 0.01, 5), vec![0.0]);
        assert!(integrate(&[], 0.01, 0.0).is_empty());
    }
}
