//! Background batch worker
//!
//! Runs a whole batch off the controlling thread. The only thing handed
//! back is the finished result list; cancelled channels are simply dropped
//! by the processor and reported as `Cancelled`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, bounded};

use crate::error::{BatchError, BatchResult};
use crate::job::{ChannelJob, ChannelResult};
use crate::pipeline::BatchProcessor;

/// Handle to a batch running on its own thread
pub struct BatchWorker {
    handle: Option<JoinHandle<()>>,
    results: Receiver<Vec<ChannelResult>>,
    cancelled: Arc<AtomicBool>,
}

impl BatchWorker {
    /// Start processing `jobs` on a new thread
    pub fn spawn(processor: BatchProcessor, jobs: Vec<ChannelJob>) -> BatchResult<Self> {
        let (tx, rx) = bounded(1);
        let cancelled = processor.cancel_flag();

        let handle = thread::Builder::new()
            .name("sm-batch".into())
            .spawn(move || {
                let results = processor.process_all(&jobs);
                if tx.send(results).is_err() {
                    log::debug!("Batch finished after its handle was dropped");
                }
            })
            .map_err(|e| BatchError::Worker(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
            results: rx,
            cancelled,
        })
    }

    /// Ask the batch to stop. Already finished channels keep their results.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Results if the batch has finished
    pub fn try_results(&self) -> BatchResult<Option<Vec<ChannelResult>>> {
        match self.results.try_recv() {
            Ok(results) => Ok(Some(results)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        }
    }

    /// Wait up to `timeout` for the results
    pub fn wait_timeout(&self, timeout: Duration) -> BatchResult<Option<Vec<ChannelResult>>> {
        match self.results.recv_timeout(timeout) {
            Ok(results) => Ok(Some(results)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(disconnected()),
        }
    }

    /// Block until the batch finishes
    pub fn wait(mut self) -> BatchResult<Vec<ChannelResult>> {
        let results = self.results.recv().map_err(|_| disconnected());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(BatchError::Worker("batch thread panicked".to_string()));
            }
        }
        results
    }
}

fn disconnected() -> BatchError {
    BatchError::Worker("batch thread exited without results".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BatchConfig, JobStatus};
    use sm_core::{InMemoryRecord, RecordReader, SmResult, SourceRecord};
    use sm_state::{ProductSet, ProductWriter};
    use std::path::Path;

    struct SineReader;

    impl RecordReader for SineReader {
        fn read(&self, _path: &Path) -> SmResult<Arc<dyn SourceRecord>> {
            let samples = (0..500).map(|i| (i as f64 * 0.2).sin()).collect();
            Ok(InMemoryRecord::new("HNE", 0.01, samples)?.into_shared())
        }
    }

    struct NullWriter;

    impl ProductWriter for NullWriter {
        fn write_products(&self, _products: &ProductSet<'_>) -> SmResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn processor() -> BatchProcessor {
        BatchProcessor::new(BatchConfig::default(), Arc::new(SineReader), Arc::new(NullWriter))
    }

    #[test]
    fn test_results_handed_back() {
        let jobs = (0..4)
            .map(|i| ChannelJob::new(i, "HNE.json").without_commit())
            .collect();
        let worker = BatchWorker::spawn(processor(), jobs).unwrap();
        let results = worker.wait().unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.is_success()));
    }

    #[test]
    fn test_cancel_before_start() {
        let processor = processor();
        processor.cancel();
        let worker = BatchWorker::spawn(processor, vec![ChannelJob::new(0, "HNE.json")]).unwrap();
        let results = worker.wait().unwrap();
        assert_eq!(results[0].status, JobStatus::Cancelled);
    }

    #[test]
    fn test_wait_timeout_eventually_returns() {
        let worker = BatchWorker::spawn(processor(), Vec::new()).unwrap();
        let mut results = None;
        for _ in 0..100 {
            results = worker.wait_timeout(Duration::from_millis(50)).unwrap();
            if results.is_some() {
                break;
            }
        }
        assert_eq!(results.map(|r| r.len()), Some(0));
    }
}
