//! Run control: cancellation and progress for batch operations

use linkforge_common::errors::{AppError, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Processed-so-far counters of a running batch
#[derive(Debug, Default)]
pub struct Progress {
    processed: AtomicUsize,
    total: AtomicUsize,
}

/// Point-in-time copy of [`Progress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// Start a new phase with `total` units of work
    pub fn reset(&self, total: usize) {
        self.processed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn advance(&self, units: usize) {
        self.processed.fetch_add(units, Ordering::Relaxed);
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed: self.processed(),
            total: self.total(),
        }
    }
}

/// Cancellation token and progress shared between a caller and a batch run.
///
/// Cloning is cheap; clones observe the same token and counters.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancel: CancellationToken,
    progress: Arc<Progress>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an externally owned token
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            progress: Arc::new(Progress::default()),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Fail with `Cancelled` if the token fired
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(AppError::Cancelled {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}
