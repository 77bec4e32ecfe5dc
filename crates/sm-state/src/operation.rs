//! Recorded editing operations

use serde::{Deserialize, Serialize};
use sm_core::{BaselineOrder, DataType, TimeWindow};

use crate::{CorrectionRequest, WaveformState};

/// Kind of a recorded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    DrawMarker,
    ShowBaselineFunction,
    HideBaselineFunction,
    PreviewBaselineCorrection,
    CommitBaselineCorrection,
    ApplyFilter,
}

impl OperationKind {
    /// Operations that change the waveform and carry a counter snapshot
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::CommitBaselineCorrection | Self::ApplyFilter)
    }
}

/// Which range field the operator is editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangeField {
    #[default]
    Function,
    Application,
}

/// Counter values right after a mutating operation ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSnapshot {
    pub corrected: u32,
    pub filtered: u32,
}

impl CountSnapshot {
    pub fn of(state: &WaveformState) -> Self {
        Self {
            corrected: state.corrected_count(),
            filtered: state.filtered_count(),
        }
    }
}

/// Full parameter set of an operation.
///
/// Every field is recorded for every kind so replay never depends on
/// anything outside the entry. Hand-written operations use
/// [`ScriptedOperation`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationParams {
    /// Viewer the operation was issued from
    pub viewer: DataType,
    pub active_range: RangeField,
    /// Function (fit) range
    pub fit: TimeWindow,
    /// Application range
    pub app: TimeWindow,
    pub event_onset: f64,
    pub low_corner: f64,
    pub high_corner: f64,
    /// Function type selection
    pub order: BaselineOrder,
    pub baseline_visible: bool,
    /// Only set on CommitBaselineCorrection / ApplyFilter
    #[serde(default)]
    pub counts: Option<CountSnapshot>,
}

impl Default for OperationParams {
    fn default() -> Self {
        Self {
            viewer: DataType::Acc,
            active_range: RangeField::Function,
            fit: TimeWindow::default(),
            app: TimeWindow::default(),
            event_onset: 0.0,
            low_corner: 0.0,
            high_corner: 0.0,
            order: BaselineOrder::Mean,
            baseline_visible: false,
            counts: None,
        }
    }
}

impl OperationParams {
    /// Parameters matching the current settings of `state`, with both
    /// ranges covering the whole record
    pub fn from_state(state: &WaveformState) -> Self {
        let (low_corner, high_corner) = state.filter_corners();
        let full = TimeWindow::new(0.0, state.duration());
        Self {
            fit: full,
            app: full,
            event_onset: state.event_onset(),
            low_corner,
            high_corner,
            ..Self::default()
        }
    }

    pub fn with_viewer(mut self, viewer: DataType) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn with_order(mut self, order: BaselineOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_fit(mut self, start: f64, stop: f64) -> Self {
        self.fit = TimeWindow::new(start, stop);
        self
    }

    pub fn with_app(mut self, start: f64, stop: f64) -> Self {
        self.app = TimeWindow::new(start, stop);
        self
    }

    pub fn with_onset(mut self, onset: f64) -> Self {
        self.event_onset = onset;
        self
    }

    pub fn with_corners(mut self, low: f64, high: f64) -> Self {
        self.low_corner = low;
        self.high_corner = high;
        self
    }

    /// Correction described by these parameters
    pub fn correction(&self) -> CorrectionRequest {
        CorrectionRequest::new(self.viewer, self.order, self.fit, self.app)
    }
}

/// One entry of the operation log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditOperation {
    pub kind: OperationKind,
    pub params: OperationParams,
}

impl EditOperation {
    pub fn new(kind: OperationKind, params: OperationParams) -> Self {
        Self { kind, params }
    }
}

/// Parameters of a hand-written operation. Absent fields take the
/// session's current settings when the operation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamsPatch {
    pub viewer: Option<DataType>,
    pub active_range: Option<RangeField>,
    pub fit: Option<TimeWindow>,
    pub app: Option<TimeWindow>,
    pub event_onset: Option<f64>,
    pub low_corner: Option<f64>,
    pub high_corner: Option<f64>,
    pub order: Option<BaselineOrder>,
    pub baseline_visible: Option<bool>,
}

impl ParamsPatch {
    /// `base` with every present field replaced
    pub fn apply(&self, base: OperationParams) -> OperationParams {
        OperationParams {
            viewer: self.viewer.unwrap_or(base.viewer),
            active_range: self.active_range.unwrap_or(base.active_range),
            fit: self.fit.unwrap_or(base.fit),
            app: self.app.unwrap_or(base.app),
            event_onset: self.event_onset.unwrap_or(base.event_onset),
            low_corner: self.low_corner.unwrap_or(base.low_corner),
            high_corner: self.high_corner.unwrap_or(base.high_corner),
            order: self.order.unwrap_or(base.order),
            baseline_visible: self.baseline_visible.unwrap_or(base.baseline_visible),
            counts: None,
        }
    }
}

/// Operation as written in an operation file or a batch manifest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedOperation {
    pub kind: OperationKind,
    #[serde(default)]
    pub params: ParamsPatch,
}

impl ScriptedOperation {
    /// Complete operation with gaps filled from `current`
    pub fn resolve(&self, current: OperationParams) -> EditOperation {
        EditOperation::new(self.kind, self.params.apply(current))
    }
}
