//! Per-viewer field cache
//!
//! Each of the ACC/VEL/DIS viewers remembers the field values last used
//! from it, so switching viewer restores them. Replay never reads this
//! cache; it is rebuilt from the operation parameters.

use sm_core::{BaselineOrder, DataType, TimeWindow};

use crate::{OperationParams, RangeField};

/// Field values shown in one viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerFields {
    pub order: BaselineOrder,
    pub active_range: RangeField,
    pub fit: TimeWindow,
    pub app: TimeWindow,
    pub low_corner: f64,
    pub high_corner: f64,
    pub event_onset: f64,
    pub baseline_visible: bool,
}

impl From<&OperationParams> for ViewerFields {
    fn from(params: &OperationParams) -> Self {
        Self {
            order: params.order,
            active_range: params.active_range,
            fit: params.fit,
            app: params.app,
            low_corner: params.low_corner,
            high_corner: params.high_corner,
            event_onset: params.event_onset,
            baseline_visible: params.baseline_visible,
        }
    }
}

/// Field cache for the three viewers
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerFieldCache {
    fields: [ViewerFields; 3],
}

impl ViewerFieldCache {
    /// Every viewer starts from the same defaults
    pub fn new(defaults: &OperationParams) -> Self {
        let fields = ViewerFields::from(defaults);
        Self {
            fields: [fields; 3],
        }
    }

    fn slot(viewer: DataType) -> usize {
        match viewer {
            DataType::Acc => 0,
            DataType::Vel => 1,
            DataType::Dis => 2,
        }
    }

    pub fn get(&self, viewer: DataType) -> &ViewerFields {
        &self.fields[Self::slot(viewer)]
    }

    /// Remember the fields of an operation issued from its viewer
    pub fn update(&mut self, params: &OperationParams) {
        self.fields[Self::slot(params.viewer)] = ViewerFields::from(params);
    }
}
