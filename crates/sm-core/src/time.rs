//! Time axis helpers: sample/time conversion and windows

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::{SmError, SmResult};

/// Relative tolerance (in samples) when mapping a time onto the sample grid
const GRID_TOLERANCE: f64 = 1e-9;

/// Record duration in seconds: `n * dt`
#[inline]
pub fn record_duration(len: usize, dt: f64) -> f64 {
    len as f64 * dt
}

/// Nyquist frequency in Hz for sampling interval `dt`
#[inline]
pub fn nyquist(dt: f64) -> f64 {
    0.5 / dt
}

/// Index of the sample nearest to `time`, clamped to the record
pub fn nearest_index(time: f64, dt: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let idx = (time / dt).round();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(len - 1)
    }
}

/// Check `value` lies in `[min, max]`
pub fn check_bounds(parameter: &'static str, value: f64, min: f64, max: f64) -> SmResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(SmError::out_of_bounds(parameter, value, min, max));
    }
    Ok(())
}

/// Closed time window `[start, stop]` in seconds from record start
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub stop: f64,
}

impl TimeWindow {
    #[inline]
    pub const fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    /// Window covering the whole record
    pub fn full(len: usize, dt: f64) -> Self {
        Self::new(0.0, record_duration(len, dt))
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    /// Validate both bounds against `[0, duration]` and `start <= stop`
    pub fn validate(
        &self,
        start_name: &'static str,
        stop_name: &'static str,
        duration: f64,
    ) -> SmResult<()> {
        check_bounds(start_name, self.start, 0.0, duration)?;
        check_bounds(stop_name, self.stop, self.start, duration)?;
        Ok(())
    }

    /// Sample indices whose time falls inside the window, or `None` when
    /// the window holds no samples.
    pub fn indices(&self, dt: f64, len: usize) -> Option<RangeInclusive<usize>> {
        if len == 0 || self.stop < self.start {
            return None;
        }
        let first = (self.start / dt - GRID_TOLERANCE).ceil().max(0.0);
        let last = (self.stop / dt + GRID_TOLERANCE).floor();
        if last < 0.0 || first > last {
            return None;
        }
        let first = first as usize;
        let last = (last as usize).min(len - 1);
        if first > last {
            return None;
        }
        Some(first..=last)
    }

    /// Number of samples inside the window
    pub fn sample_count(&self, dt: f64, len: usize) -> usize {
        self.indices(dt, len)
            .map(|range| range.end() - range.start() + 1)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_indices_on_grid() {
        let window = TimeWindow::new(0.0, 2.0);
        let range = window.indices(0.01, 1000).unwrap();
        assert_eq!(*range.start(), 0);
        assert_eq!(*range.end(), 200);
    }

    #[test]
    fn test_window_clamped_to_record() {
        let window = TimeWindow::new(0.0, 10.0);
        let range = window.indices(0.01, 1000).unwrap();
        assert_eq!(*range.end(), 999);
        assert_eq!(window.sample_count(0.01, 1000), 1000);
    }

    #[test]
    fn test_window_between_samples_is_empty() {
        let window = TimeWindow::new(0.012, 0.018);
        assert!(window.indices(0.01, 100).is_none());
        assert_eq!(window.sample_count(0.01, 100), 0);
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let window = TimeWindow::new(5.0, 2.0);
        assert!(matches!(
            window.validate("start", "stop", 10.0),
            Err(SmError::OutOfBounds { parameter: "stop", .. })
        ));
    }

    #[test]
    fn test_nearest_index() {
        assert_eq!(nearest_index(-1.0, 0.01, 100), 0);
        assert_eq!(nearest_index(0.504, 0.01, 100), 50);
        assert_eq!(nearest_index(50.0, 0.01, 100), 99);
    }
}
