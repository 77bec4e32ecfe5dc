//! Enumerations shared across the processing chain

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the three derived traces an operation targets.
///
/// Also used as the viewer selector: the editor shows one viewer per trace
/// and every recorded operation names the viewer it was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Acc,
    Vel,
    Dis,
}

impl DataType {
    pub const ALL: [DataType; 3] = [DataType::Acc, DataType::Vel, DataType::Dis];

    /// Short upper-case code (ACC, VEL, DIS)
    pub fn code(self) -> &'static str {
        match self {
            Self::Acc => "ACC",
            Self::Vel => "VEL",
            Self::Dis => "DIS",
        }
    }

    /// Single-letter tag used in annotation lines
    pub fn tag_letter(self) -> char {
        match self {
            Self::Acc => 'A',
            Self::Vel => 'V',
            Self::Dis => 'D',
        }
    }

    /// Whether baseline corrections may be fit against this trace
    pub fn is_correctable(self) -> bool {
        matches!(self, Self::Acc | Self::Vel)
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::Acc
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Baseline trend function order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaselineOrder {
    Mean,
    Order1,
    Order2,
    Order3,
    Spline,
    None,
}

impl BaselineOrder {
    pub const ALL: [BaselineOrder; 6] = [
        BaselineOrder::Mean,
        BaselineOrder::Order1,
        BaselineOrder::Order2,
        BaselineOrder::Order3,
        BaselineOrder::Spline,
        BaselineOrder::None,
    ];

    /// Canonical upper-case name as written in annotations
    pub fn name(self) -> &'static str {
        match self {
            Self::Mean => "MEAN",
            Self::Order1 => "ORDER1",
            Self::Order2 => "ORDER2",
            Self::Order3 => "ORDER3",
            Self::Spline => "SPLINE",
            Self::None => "NONE",
        }
    }

    /// Parse a canonical name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|order| order.name().eq_ignore_ascii_case(name))
    }

    /// Polynomial degree, if this order is a polynomial (MEAN is degree 0)
    pub fn degree(self) -> Option<usize> {
        match self {
            Self::Mean => Some(0),
            Self::Order1 => Some(1),
            Self::Order2 => Some(2),
            Self::Order3 => Some(3),
            Self::Spline | Self::None => None,
        }
    }

    pub fn is_polynomial(self) -> bool {
        self.degree().is_some()
    }

    /// Minimum number of samples in the fit window
    pub fn required_samples(self) -> usize {
        match self {
            Self::None => 0,
            Self::Mean => 1,
            Self::Order1 => 2,
            Self::Order2 => 3,
            Self::Order3 | Self::Spline => 4,
        }
    }

    /// Order of the acceleration-domain trend implied by a velocity-domain
    /// trend of this order.
    ///
    /// A degree-n polynomial in velocity differentiates to degree n-1 in
    /// acceleration. SPLINE is not polynomial and is left unchanged. ORDER3
    /// has no mapping because it is only accepted on acceleration.
    pub fn demoted(self) -> Option<Self> {
        match self {
            Self::Order2 => Some(Self::Order1),
            Self::Order1 => Some(Self::Mean),
            Self::Mean => Some(Self::None),
            Self::Spline => Some(Self::Spline),
            Self::None => Some(Self::None),
            Self::Order3 => None,
        }
    }
}

impl fmt::Display for BaselineOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Processing lifecycle status of a waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// Fresh from the source record
    Reset,
    /// A cosmetic operation happened, waveform untouched
    Edit,
    /// At least one baseline correction committed since reset or last filter
    Corrected,
    /// Filtered since the most recent correction
    Filtered,
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        Self::Reset
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Reset => "RESET",
            Self::Edit => "EDIT",
            Self::Corrected => "CORRECTED",
            Self::Filtered => "FILTERED",
        };
        f.write_str(s)
    }
}
