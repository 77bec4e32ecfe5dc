//! Multi-channel batch processing
//!
//! Channels are independent, so a batch runs them in parallel on a rayon
//! pool. A single channel is always processed sequentially through its own
//! `EditorSession`:
//! 1. Read the source record
//! 2. Commit the baseline steps decoded from annotations
//! 3. Execute the scripted operations
//! 4. Apply the final filter (optional)
//! 5. Write products through the commit gate (optional)

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sm_core::RecordReader;
use sm_state::{EditorSession, OperationKind, ProductWriter, parse_baseline_steps};

use crate::config::BatchConfig;
use crate::error::{BatchError, BatchResult};
use crate::job::{ChannelJob, ChannelResult};

/// Batch execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Complete,
    Cancelled,
}

/// Batch progress snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub state: BatchState,
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Fraction of jobs finished (0.0 - 1.0)
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Batch processor for many channels
pub struct BatchProcessor {
    config: BatchConfig,
    reader: Arc<dyn RecordReader>,
    writer: Arc<dyn ProductWriter>,

    // Progress tracking
    state: Arc<RwLock<BatchState>>,
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl BatchProcessor {
    pub fn new(
        config: BatchConfig,
        reader: Arc<dyn RecordReader>,
        writer: Arc<dyn ProductWriter>,
    ) -> Self {
        Self {
            config,
            reader,
            writer,
            state: Arc::new(RwLock::new(BatchState::Idle)),
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Cancel the running batch, or the next one if none is running.
    /// Jobs not yet finished report `Cancelled`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancel flag for sharing with another thread
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            state: *self.state.read(),
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }

    fn set_state(&self, state: BatchState) {
        *self.state.write() = state;
    }

    fn check_cancelled(&self) -> BatchResult<()> {
        if self.is_cancelled() {
            Err(BatchError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Process one channel; returns the finished session.
    ///
    /// Cancellation is checked before the record is read and before every
    /// operation. A cancelled session is dropped.
    pub fn process_job(&self, job: &ChannelJob) -> BatchResult<EditorSession> {
        let config = &self.config.processing;
        self.check_cancelled()?;

        let record = self.reader.read(&job.record)?;
        let mut session = EditorSession::open(record, config.clone())?;

        for step in parse_baseline_steps(&job.annotations) {
            self.check_cancelled()?;
            let fit = step.fit_window();
            let app = step.app_window();
            let params = session
                .default_params()
                .with_viewer(step.source_type())
                .with_order(step.order_original())
                .with_fit(fit.start, fit.stop)
                .with_app(app.start, app.stop);
            session.commit_correction(params)?;
        }

        for op in &job.operations {
            self.check_cancelled()?;
            session.perform_scripted(op)?;
        }

        if let Some(corners) = job.filter {
            self.check_cancelled()?;
            let params = session.default_params().with_corners(corners.low, corners.high);
            session.perform(OperationKind::ApplyFilter, params)?;
        }
        Ok(session)
    }

    /// Process one channel into a result, writing products if requested
    fn run_job(&self, job: &ChannelJob) -> ChannelResult {
        let start = Instant::now();
        let outcome = self.process_job(job).and_then(|session| {
            self.check_cancelled()?;
            let lines = if job.commit {
                session.commit(self.writer.as_ref())?
            } else {
                Vec::new()
            };
            Ok((session, lines))
        });
        self.completed.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Ok((session, lines)) => ChannelResult::success(
                job.id,
                session.record().channel_code().to_string(),
                session.state().correction_steps().len(),
                lines,
                start.elapsed(),
            ),
            Err(BatchError::Cancelled) => {
                log::warn!("Job {} cancelled", job.id);
                ChannelResult::cancelled(job.id, start.elapsed())
            }
            Err(e) => {
                log::warn!("Job {} ({}) failed: {}", job.id, job.record.display(), e);
                ChannelResult::failure(job.id, e.to_string(), start.elapsed())
            }
        }
    }

    /// Process all jobs in parallel, one channel per task
    pub fn process_all(&self, jobs: &[ChannelJob]) -> Vec<ChannelResult> {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(jobs.len(), Ordering::Relaxed);
        self.set_state(BatchState::Running);
        log::info!(
            "Processing {} channels on {} threads",
            jobs.len(),
            self.config.effective_threads()
        );

        let run = || -> Vec<ChannelResult> { jobs.par_iter().map(|job| self.run_job(job)).collect() };
        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.thread_count)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!("Falling back to the global thread pool: {e}");
                run()
            }
        };

        // A cancel covers one batch; the next run starts clean
        let cancelled = self.cancelled.swap(false, Ordering::SeqCst);
        self.set_state(if cancelled {
            BatchState::Cancelled
        } else {
            BatchState::Complete
        });
        results
    }
}
