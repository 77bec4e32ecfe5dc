//! Event-onset estimate

use sm_core::{Sample, record_duration};

/// Time of the first sample reaching `threshold_pct` percent of the peak
/// absolute amplitude, moved back by `offset` seconds and clamped to the
/// record.
///
/// A silent record yields 0.
pub fn estimate_event_onset(samples: &[Sample], dt: f64, threshold_pct: f64, offset: f64) -> f64 {
    let peak = samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
    if peak == 0.0 {
        return 0.0;
    }

    let threshold = threshold_pct / 100.0 * peak;
    let first = samples
        .iter()
        .position(|s| s.abs() >= threshold)
        .unwrap_or(0);

    (first as f64 * dt - offset).clamp(0.0, record_duration(samples.len(), dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_onset_before_shaking() {
        let mut samples = vec![0.001; 1000];
        for (i, s) in samples.iter_mut().enumerate().skip(400) {
            *s = ((i - 400) as f64 * 0.3).sin();
        }
        let onset = estimate_event_onset(&samples, 0.01, 5.0, 1.0);
        // First crossing is at sample 401 (t = 4.01 s)
        assert_abs_diff_eq!(onset, 3.01, epsilon = 1e-9);
    }

    #[test]
    fn test_clamped_at_zero() {
        let samples = vec![1.0; 100];
        assert_eq!(estimate_event_onset(&samples, 0.01, 5.0, 1.0), 0.0);
    }

    #[test]
    fn test_silent_record() {
        assert_eq!(estimate_event_onset(&[0.0; 10], 0.01, 5.0, 1.0), 0.0);
    }
}
