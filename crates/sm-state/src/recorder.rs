//! Operation recorder and replay
//!
//! The log is append/truncate only. Any point in history is reconstructed
//! by replaying the log from a fresh state built from the source record;
//! intermediate states are never stored.

use std::borrow::Cow;

use sm_core::{DataType, ProcessingConfig, Sample, SmError, SmResult, SourceRecord};

use crate::{
    CountSnapshot, EditOperation, OperationKind, OperationParams, ViewerFieldCache, ViewerFields,
    WaveformState,
};

/// Fitted trend drawn over a viewer
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineOverlay {
    pub data_type: DataType,
    pub fitted: Vec<Sample>,
}

/// Everything an operation can affect: the waveform itself plus the
/// derived editor state around it
#[derive(Debug, Clone, PartialEq)]
pub struct EditContext {
    pub state: WaveformState,
    pub fields: ViewerFieldCache,
    pub active_viewer: DataType,
    pub overlay: Option<BaselineOverlay>,
    pub preview: Option<WaveformState>,
}

impl EditContext {
    /// Context around a fresh state from `record`
    pub fn fresh(record: &dyn SourceRecord, config: &ProcessingConfig) -> SmResult<Self> {
        let state = WaveformState::create(record, config, None)?;
        Ok(Self::around(state))
    }

    pub fn around(state: WaveformState) -> Self {
        let defaults = OperationParams::from_state(&state);
        Self {
            fields: ViewerFieldCache::new(&defaults),
            state,
            active_viewer: DataType::Acc,
            overlay: None,
            preview: None,
        }
    }

    /// Fields of the viewer the last operation came from
    pub fn active_fields(&self) -> &ViewerFields {
        self.fields.get(self.active_viewer)
    }

    /// Run one operation. Either everything succeeds or `self` is untouched.
    pub fn execute(&mut self, op: &EditOperation, config: &ProcessingConfig) -> SmResult<()> {
        let params = &op.params;
        match op.kind {
            OperationKind::DrawMarker => {
                self.state.mark_edited();
            }
            OperationKind::ShowBaselineFunction => {
                let fitted = anchored(&self.state, params.event_onset)?
                    .fit_correction(&params.correction(), config.spline_knot_spacing)?;
                self.overlay = Some(BaselineOverlay {
                    data_type: params.viewer,
                    fitted,
                });
                self.state.mark_edited();
            }
            OperationKind::HideBaselineFunction => {
                self.overlay = None;
                self.state.mark_edited();
            }
            OperationKind::PreviewBaselineCorrection => {
                let request = params.correction();
                let base = anchored(&self.state, params.event_onset)?;
                let fitted = base.fit_correction(&request, config.spline_knot_spacing)?;
                self.preview = Some(base.preview_correction(&request, &fitted)?);
            }
            OperationKind::CommitBaselineCorrection => {
                let request = params.correction();
                let mut next = self.state.clone();
                next.set_event_onset(params.event_onset)?;
                next.correct(&request, config.spline_knot_spacing)?;
                self.state = next;
                self.overlay = None;
                self.preview = None;
            }
            OperationKind::ApplyFilter => {
                self.state.apply_filter(
                    params.low_corner,
                    params.high_corner,
                    params.event_onset,
                    config,
                )?;
                self.preview = None;
            }
        }

        self.fields.update(params);
        self.active_viewer = params.viewer;
        Ok(())
    }
}

/// `state` re-anchored at `onset`, the base a commit with the same
/// parameters fits against
fn anchored(state: &WaveformState, onset: f64) -> SmResult<Cow<'_, WaveformState>> {
    if onset == state.event_onset() {
        return Ok(Cow::Borrowed(state));
    }
    let mut base = state.clone();
    base.set_event_onset(onset)?;
    Ok(Cow::Owned(base))
}

/// Summary of the recorder position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSummary {
    pub total: usize,
    pub position: usize,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Linear operation log with a cursor
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Vec<EditOperation>,
    /// Number of entries in effect; `entries[position - 1]` is active
    position: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append after the cursor, discarding everything beyond it
    pub fn append(&mut self, op: EditOperation) {
        if self.position < self.entries.len() {
            log::debug!(
                "Branch cut: dropping {} entries after position {}",
                self.entries.len() - self.position,
                self.position
            );
            self.entries.truncate(self.position);
        }
        self.entries.push(op);
        self.position = self.entries.len();
    }

    /// Move the cursor without touching the log
    pub fn set_position(&mut self, position: usize) -> SmResult<()> {
        if position > self.entries.len() {
            return Err(SmError::InvalidParameter(format!(
                "position {} beyond log of {} entries",
                position,
                self.entries.len()
            )));
        }
        self.position = position;
        Ok(())
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Active entry, if any
    pub fn current(&self) -> Option<&EditOperation> {
        if self.position > 0 {
            self.entries.get(self.position - 1)
        } else {
            None
        }
    }

    pub fn entries(&self) -> &[EditOperation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.position > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.position < self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = 0;
    }

    pub fn summary(&self) -> RecorderSummary {
        RecorderSummary {
            total: self.entries.len(),
            position: self.position,
            can_go_back: self.can_go_back(),
            can_go_forward: self.can_go_forward(),
        }
    }

    /// Rebuild the context after the first `position` entries, starting
    /// from a fresh state of `record`.
    ///
    /// # Errors
    ///
    /// [`SmError::InvalidParameter`] for a position beyond the log, or the
    /// first error raised by an entry.
    pub fn replay(
        &self,
        record: &dyn SourceRecord,
        config: &ProcessingConfig,
        position: usize,
    ) -> SmResult<EditContext> {
        let Some(ops) = self.entries.get(..position) else {
            return Err(SmError::InvalidParameter(format!(
                "position {} beyond log of {} entries",
                position,
                self.entries.len()
            )));
        };

        let mut ctx = EditContext::fresh(record, config)?;
        for (index, op) in ops.iter().enumerate() {
            ctx.execute(op, config)?;
            check_counts(index, op, &ctx.state);
        }

        log::debug!(
            "Replayed {} of {} entries for {}",
            position,
            self.entries.len(),
            record.channel_code()
        );
        Ok(ctx)
    }

    /// Rebuild the context after `entries[..=index]`
    pub fn replay_up_to(
        &self,
        record: &dyn SourceRecord,
        config: &ProcessingConfig,
        index: usize,
    ) -> SmResult<EditContext> {
        self.replay(record, config, index + 1)
    }
}

/// Counter snapshots are informational; a mismatch is only reported
fn check_counts(index: usize, op: &EditOperation, state: &WaveformState) {
    if let Some(recorded) = op.params.counts {
        let actual = CountSnapshot::of(state);
        if actual != recorded {
            log::warn!(
                "Replay of entry {} ({:?}) gave counts {:?}, recorded {:?}",
                index,
                op.kind,
                actual,
                recorded
            );
        }
    }
}
