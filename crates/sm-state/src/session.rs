//! Editor session for one channel
//!
//! Every editing call is executed on a copy of the current context and only
//! recorded and swapped in once it has succeeded. History navigation always
//! replays from the source record.

use std::sync::Arc;

use sm_core::{DataType, ProcessingConfig, SmResult, SourceRecord};

use crate::{
    BaselineOverlay, ChannelMetadata, CommitGate, CountSnapshot, EditContext, EditOperation,
    OperationKind, OperationParams, ProductWriter, Recorder, ScriptedOperation, ViewerFields,
    WaveformState, format_baseline_step,
};

/// Operator-facing editing session
pub struct EditorSession {
    record: Arc<dyn SourceRecord>,
    config: ProcessingConfig,
    recorder: Recorder,
    context: EditContext,
}

impl EditorSession {
    /// Open a session on a fresh state of `record`
    pub fn open(record: Arc<dyn SourceRecord>, config: ProcessingConfig) -> SmResult<Self> {
        let context = EditContext::fresh(record.as_ref(), &config)?;
        log::info!(
            "Opened session for {} ({} samples)",
            record.channel_code(),
            record.len()
        );
        Ok(Self {
            record,
            config,
            recorder: Recorder::new(),
            context,
        })
    }

    pub fn record(&self) -> &dyn SourceRecord {
        self.record.as_ref()
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn context(&self) -> &EditContext {
        &self.context
    }

    pub fn state(&self) -> &WaveformState {
        &self.context.state
    }

    pub fn overlay(&self) -> Option<&BaselineOverlay> {
        self.context.overlay.as_ref()
    }

    pub fn preview(&self) -> Option<&WaveformState> {
        self.context.preview.as_ref()
    }

    /// Cached fields of a viewer, restored when the operator switches to it
    pub fn viewer_fields(&self, viewer: DataType) -> &ViewerFields {
        self.context.fields.get(viewer)
    }

    /// Parameters pre-filled from the current state
    pub fn default_params(&self) -> OperationParams {
        OperationParams::from_state(&self.context.state)
    }

    /// Execute and record one operation.
    ///
    /// On error nothing is recorded and the session is unchanged.
    pub fn perform(&mut self, kind: OperationKind, params: OperationParams) -> SmResult<()> {
        let mut op = EditOperation::new(kind, params);
        let mut next = self.context.clone();
        next.execute(&op, &self.config)?;

        op.params.counts = kind.is_mutating().then(|| CountSnapshot::of(&next.state));
        self.recorder.append(op);
        self.context = next;

        log::debug!(
            "{}: {:?} recorded at position {}",
            self.record.channel_code(),
            kind,
            self.recorder.position()
        );
        Ok(())
    }

    /// Execute a hand-written operation, filling absent parameters from
    /// the current settings
    pub fn perform_scripted(&mut self, op: &ScriptedOperation) -> SmResult<()> {
        let resolved = op.resolve(self.default_params());
        self.perform(resolved.kind, resolved.params)
    }

    pub fn draw_marker(&mut self, params: OperationParams) -> SmResult<()> {
        self.perform(OperationKind::DrawMarker, params)
    }

    pub fn show_baseline(&mut self, params: OperationParams) -> SmResult<()> {
        self.perform(OperationKind::ShowBaselineFunction, params)
    }

    pub fn hide_baseline(&mut self, params: OperationParams) -> SmResult<()> {
        self.perform(OperationKind::HideBaselineFunction, params)
    }

    pub fn preview_correction(&mut self, params: OperationParams) -> SmResult<()> {
        self.perform(OperationKind::PreviewBaselineCorrection, params)
    }

    pub fn commit_correction(&mut self, params: OperationParams) -> SmResult<()> {
        self.perform(OperationKind::CommitBaselineCorrection, params)
    }

    pub fn apply_filter(&mut self, params: OperationParams) -> SmResult<()> {
        self.perform(OperationKind::ApplyFilter, params)
    }

    /// Re-derive the context after the first `position` entries
    pub fn go_to(&mut self, position: usize) -> SmResult<()> {
        let context = self
            .recorder
            .replay(self.record.as_ref(), &self.config, position)?;
        self.recorder.set_position(position)?;
        self.context = context;
        Ok(())
    }

    /// Step back one entry. Returns false at the start of the log.
    pub fn undo(&mut self) -> SmResult<bool> {
        if !self.recorder.can_go_back() {
            return Ok(false);
        }
        self.go_to(self.recorder.position() - 1)?;
        Ok(true)
    }

    /// Step forward one entry. Returns false at the end of the log.
    pub fn redo(&mut self) -> SmResult<bool> {
        if !self.recorder.can_go_forward() {
            return Ok(false);
        }
        self.go_to(self.recorder.position() + 1)?;
        Ok(true)
    }

    /// Fresh state from the source and an empty log
    pub fn reset(&mut self) -> SmResult<()> {
        self.context = EditContext::fresh(self.record.as_ref(), &self.config)?;
        self.recorder.clear();
        log::info!("Reset session for {}", self.record.channel_code());
        Ok(())
    }

    pub fn metadata(&self) -> ChannelMetadata {
        ChannelMetadata::from_record(self.record.as_ref())
    }

    /// Correction history in annotation form
    pub fn annotations(&self) -> Vec<String> {
        self.context
            .state
            .correction_steps()
            .iter()
            .map(format_baseline_step)
            .collect()
    }

    /// Write products through the commit gate
    pub fn commit(&self, writer: &dyn ProductWriter) -> SmResult<Vec<String>> {
        CommitGate::commit(&self.context.state, &self.metadata(), writer)
    }
}

/// Reset every session, stopping at the first failure
pub fn reset_all(sessions: &mut [EditorSession]) -> SmResult<()> {
    for session in sessions.iter_mut() {
        session.reset()?;
    }
    Ok(())
}
