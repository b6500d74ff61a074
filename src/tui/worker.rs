//! Background batch worker.
//!
//! Runs a record-file batch on its own thread so the TUI main loop keeps
//! drawing while rows are processed.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::adapters::{JsonRecordFile, StorageError};
use crate::application::{BatchReport, CalculationService};
use crate::ports::Storage;

/// Progress updates from the batch worker.
#[derive(Debug, Clone)]
pub enum BatchProgress {
    /// Reading the record file
    Loading,
    /// `done` of `total` rows processed
    Row { done: usize, total: usize },
    /// All rows processed
    Complete(BatchReport),
    /// The file could not be loaded
    Error(String),
}

/// Handle to a running batch worker.
pub struct BatchWorkerHandle {
    /// Receiver for progress updates
    pub progress_rx: Receiver<BatchProgress>,
    _handle: JoinHandle<()>,
}

impl BatchWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<BatchProgress> {
        self.progress_rx.try_recv().ok()
    }
}

/// Worker that runs a batch in the background.
pub struct BatchWorker;

impl BatchWorker {
    /// Spawn a batch over the JSON record file at `path`.
    pub fn spawn<S>(service: Arc<CalculationService<S>>, path: PathBuf) -> BatchWorkerHandle
    where
        S: Storage + 'static,
        S::Error: Into<StorageError>,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_with_progress(&service, &JsonRecordFile::new(path), &tx);
        });

        BatchWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_with_progress<S>(
        service: &CalculationService<S>,
        source: &JsonRecordFile,
        tx: &Sender<BatchProgress>,
    ) where
        S: Storage,
        S::Error: Into<StorageError>,
    {
        let _ = tx.send(BatchProgress::Loading);

        let result = service.run_source(source, |done, total| {
            let _ = tx.send(BatchProgress::Row { done, total });
        });

        match result {
            Ok(report) => {
                let _ = tx.send(BatchProgress::Complete(report));
            }
            Err(e) => {
                tracing::warn!("Batch import failed: {}", e);
                let _ = tx.send(BatchProgress::Error(e.to_string()));
            }
        }
    }
}
