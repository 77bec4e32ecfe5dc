//! Recorded baseline-correction steps

use serde::{Deserialize, Serialize};
use sm_core::{BaselineOrder, DataType, SmError, SmResult, TimeWindow};

/// One committed baseline correction, in application order.
///
/// Steps are immutable once created; `WaveformState` only ever appends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineStep {
    fit: TimeWindow,
    app: TimeWindow,
    source_type: DataType,
    target_type_final: DataType,
    order_original: BaselineOrder,
    order_final: BaselineOrder,
    sequence_index: usize,
}

impl BaselineStep {
    /// Build a step, resolving the final order and target by the degree
    /// propagation rule.
    ///
    /// # Errors
    ///
    /// [`SmError::InvalidParameter`] for a DIS source, a NONE order, or
    /// ORDER3 on VEL.
    pub fn resolve(
        source_type: DataType,
        order: BaselineOrder,
        fit: TimeWindow,
        app: TimeWindow,
        sequence_index: usize,
    ) -> SmResult<Self> {
        let (target_type_final, order_final) = propagate(source_type, order)?;
        Ok(Self {
            fit,
            app,
            source_type,
            target_type_final,
            order_original: order,
            order_final,
            sequence_index,
        })
    }

    pub fn fit_window(&self) -> TimeWindow {
        self.fit
    }

    pub fn app_window(&self) -> TimeWindow {
        self.app
    }

    pub fn source_type(&self) -> DataType {
        self.source_type
    }

    pub fn target_type_final(&self) -> DataType {
        self.target_type_final
    }

    pub fn order_original(&self) -> BaselineOrder {
        self.order_original
    }

    pub fn order_final(&self) -> BaselineOrder {
        self.order_final
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }
}

/// Final target and order of a correction fit on `source` with `order`.
///
/// ACC corrections are recorded as requested. VEL corrections are demoted by
/// one degree (ORDER2 -> ORDER1 -> MEAN -> NONE); SPLINE is not polynomial
/// and keeps its order. A VEL step stays expressed against VEL when the
/// demoted order has no acceleration-domain trend (NONE or SPLINE).
pub fn propagate(source: DataType, order: BaselineOrder) -> SmResult<(DataType, BaselineOrder)> {
    if order == BaselineOrder::None {
        return Err(SmError::InvalidParameter(
            "NONE is not a correction order".to_string(),
        ));
    }
    match source {
        DataType::Acc => Ok((DataType::Acc, order)),
        DataType::Vel => {
            let demoted = order.demoted().ok_or_else(|| {
                SmError::InvalidParameter(format!(
                    "{order} is only accepted on acceleration"
                ))
            })?;
            let target = match demoted {
                BaselineOrder::Mean | BaselineOrder::Order1 | BaselineOrder::Order2 => {
                    DataType::Acc
                }
                _ => DataType::Vel,
            };
            Ok((target, demoted))
        }
        DataType::Dis => Err(SmError::InvalidParameter(
            "displacement cannot be baseline corrected".to_string(),
        )),
    }
}
