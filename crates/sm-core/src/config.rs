//! Processing configuration
//!
//! Operator/site defaults supplied from outside the processing core:
//! - Butterworth filter order and default corners
//! - Strong-motion threshold and event-onset offset
//! - Taper length applied before filtering
//! - Differentiation stencil width
//! - Smoothing-spline knot spacing

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{SmError, SmResult};

/// Stencil widths accepted for central differentiation
pub const DIFFERENTIAL_ORDERS: [usize; 4] = [3, 5, 7, 9];

/// Processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Butterworth order per band edge (even)
    pub filter_order: usize,
    /// Percentage of peak |ACC| marking the start of strong shaking
    pub strong_motion_threshold_pct: f64,
    /// Cosine taper length at each record end (seconds)
    pub taper_length: f64,
    /// Central-difference stencil width (points)
    pub differential_order: usize,
    /// Default high-pass corner (Hz)
    pub low_corner_default: f64,
    /// Default low-pass corner (Hz), clamped to Nyquist on use
    pub high_corner_default: f64,
    /// Seconds subtracted from the threshold crossing for the onset estimate
    pub event_onset_offset: f64,
    /// Knot spacing for SPLINE baseline fits (seconds)
    pub spline_knot_spacing: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            filter_order: 4,
            strong_motion_threshold_pct: 5.0,
            taper_length: 2.0,
            differential_order: 5,
            low_corner_default: 0.1,
            high_corner_default: 25.0,
            event_onset_offset: 1.0,
            spline_knot_spacing: 1.0,
        }
    }
}

impl ProcessingConfig {
    /// Reject values no record could be processed with
    pub fn validate(&self) -> SmResult<()> {
        if self.filter_order == 0 || self.filter_order % 2 != 0 || self.filter_order > 12 {
            return Err(SmError::InvalidParameter(format!(
                "filter_order must be even and in 2..=12, got {}",
                self.filter_order
            )));
        }
        if !DIFFERENTIAL_ORDERS.contains(&self.differential_order) {
            return Err(SmError::InvalidParameter(format!(
                "differential_order must be one of {:?}, got {}",
                DIFFERENTIAL_ORDERS, self.differential_order
            )));
        }
        if !(0.0..=100.0).contains(&self.strong_motion_threshold_pct) {
            return Err(SmError::InvalidParameter(format!(
                "strong_motion_threshold_pct must be in [0, 100], got {}",
                self.strong_motion_threshold_pct
            )));
        }
        if self.taper_length < 0.0 || self.event_onset_offset < 0.0 {
            return Err(SmError::InvalidParameter(
                "taper_length and event_onset_offset must be non-negative".to_string(),
            ));
        }
        if self.low_corner_default < 0.0 || self.high_corner_default < self.low_corner_default {
            return Err(SmError::InvalidParameter(format!(
                "default corners must satisfy 0 <= low <= high, got {} / {}",
                self.low_corner_default, self.high_corner_default
            )));
        }
        if self.spline_knot_spacing <= 0.0 {
            return Err(SmError::InvalidParameter(format!(
                "spline_knot_spacing must be positive, got {}",
                self.spline_knot_spacing
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file, falling back to defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Malformed config {}: {}, using defaults", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration as pretty JSON
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SmResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
