//! Baseline trend fitting and removal
//!
//! A trend is fit using only the samples inside a fit window and then
//! evaluated over the full time axis, so it can be subtracted over a
//! different (usually larger) application window.

use nalgebra::{DMatrix, DVector};
use sm_core::{BaselineOrder, Sample, SmError, SmResult, TimeWindow};

use crate::spline::NaturalCubicSpline;

/// Minimum number of knots for a SPLINE fit
const MIN_SPLINE_SEGMENTS: usize = 3;

/// Singular values below this fraction of the largest are dropped
const SVD_EPS: f64 = 1e-12;

/// Fit a baseline of `order` to `samples` within `fit` and evaluate it over
/// the whole record.
///
/// `knot_spacing` (seconds) only affects SPLINE fits. The result has the
/// same length as `samples`.
///
/// # Errors
///
/// [`SmError::InsufficientSamples`] when the fit window holds fewer samples
/// than the order needs.
pub fn fit_baseline(
    samples: &[Sample],
    dt: f64,
    fit: TimeWindow,
    order: BaselineOrder,
    knot_spacing: f64,
) -> SmResult<Vec<Sample>> {
    let n = samples.len();
    if order == BaselineOrder::None {
        return Ok(vec![0.0; n]);
    }

    let available = fit.sample_count(dt, n);
    let required = order.required_samples();
    let range = match fit.indices(dt, n) {
        Some(range) if available >= required => range,
        _ => {
            return Err(SmError::InsufficientSamples {
                order,
                required,
                available,
            });
        }
    };

    let first = *range.start();
    let window = &samples[range];

    log::debug!(
        "Fitting {} baseline over {} samples starting at index {}",
        order,
        window.len(),
        first
    );

    match order {
        BaselineOrder::Mean => {
            let mean = window.iter().sum::<f64>() / window.len() as f64;
            Ok(vec![mean; n])
        }
        BaselineOrder::Order1 | BaselineOrder::Order2 | BaselineOrder::Order3 => {
            let degree = order.degree().unwrap_or(1);
            fit_polynomial(window, first, dt, degree, n)
        }
        BaselineOrder::Spline => Ok(fit_spline(window, first, dt, knot_spacing, n)),
        BaselineOrder::None => Ok(vec![0.0; n]),
    }
}

/// Least-squares polynomial in centred, scaled time, evaluated for all `n`
fn fit_polynomial(
    window: &[Sample],
    first: usize,
    dt: f64,
    degree: usize,
    n: usize,
) -> SmResult<Vec<Sample>> {
    let count = window.len();
    let t0 = first as f64 * dt;
    let t1 = (first + count - 1) as f64 * dt;
    let center = 0.5 * (t0 + t1);
    let scale = if t1 > t0 { 0.5 * (t1 - t0) } else { 1.0 };

    let design = DMatrix::from_fn(count, degree + 1, |row, col| {
        let x = ((first + row) as f64 * dt - center) / scale;
        x.powi(col as i32)
    });
    let rhs = DVector::from_column_slice(window);

    let coeffs = design
        .svd(true, true)
        .solve(&rhs, SVD_EPS)
        .map_err(|e| SmError::InvalidParameter(format!("polynomial fit failed: {e}")))?;

    Ok((0..n)
        .map(|i| {
            let x = (i as f64 * dt - center) / scale;
            coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
        })
        .collect())
}

/// Smoothing spline through segment means, held constant beyond the knots
fn fit_spline(window: &[Sample], first: usize, dt: f64, knot_spacing: f64, n: usize) -> Vec<Sample> {
    let count = window.len();
    let duration = count as f64 * dt;
    let segments = ((duration / knot_spacing).round() as usize)
        .max(MIN_SPLINE_SEGMENTS)
        .min(count);

    let mut knots_x = Vec::with_capacity(segments);
    let mut knots_y = Vec::with_capacity(segments);
    for seg in 0..segments {
        let lo = seg * count / segments;
        let hi = (seg + 1) * count / segments;
        let len = (hi - lo) as f64;
        let mean_t = (lo..hi).map(|i| (first + i) as f64 * dt).sum::<f64>() / len;
        let mean_y = window[lo..hi].iter().sum::<f64>() / len;
        knots_x.push(mean_t);
        knots_y.push(mean_y);
    }

    match NaturalCubicSpline::new(knots_x, knots_y) {
        Some(spline) => (0..n).map(|i| spline.eval(i as f64 * dt)).collect(),
        None => {
            // Only reachable with a single segment; degrade to the mean
            let mean = window.iter().sum::<f64>() / count as f64;
            vec![mean; n]
        }
    }
}

/// Subtract `fitted` from `samples` inside `app` only
pub fn subtract_in_window(samples: &mut [Sample], fitted: &[Sample], dt: f64, app: TimeWindow) {
    debug_assert_eq!(samples.len(), fitted.len());
    if let Some(range) = app.indices(dt, samples.len()) {
        for i in range {
            samples[i] -= fitted[i];
        }
    }
}
