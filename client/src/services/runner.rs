//! Sequential batch runner
//!
//! Runs an ordered list of work items one at a time. Each item either passes
//! a local pre-check and is submitted to the service, or is rejected. Items
//! never overlap, and consecutive submissions are separated by a fixed pause.
//! An auth-class failure stops the batch; any other failure is recorded and
//! the batch continues.

use std::time::Duration;

use async_trait::async_trait;
use shared::FailedItem;
use thiserror::Error;

use crate::error::{ApiError, AppError};
use crate::progress::ProgressReporter;

/// Failure of one submitted item
#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ItemError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ItemError::Api(e) if e.is_auth_failure())
    }

    fn reason(&self) -> String {
        match self {
            ItemError::Api(e) => e.reason(),
            ItemError::Io(e) => e.to_string(),
        }
    }
}

impl From<ItemError> for AppError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::Api(e) => AppError::Api(e),
            ItemError::Io(e) => AppError::Io(e),
        }
    }
}

/// One kind of batch work
#[async_trait]
pub trait BatchTask: Send + Sync {
    type Item: Send;
    type Output: Send;

    /// Name used in failure reports
    fn label(&self, item: &Self::Item) -> String;

    /// Progress message shown while `item` is worked on
    fn describe(&self, index: usize, total: usize, item: &Self::Item) -> String;

    /// Local check run before any service call; `Err` carries the reason
    fn precheck(&self, _item: &Self::Item) -> Result<(), String> {
        Ok(())
    }

    async fn submit(&self, item: Self::Item) -> Result<Self::Output, ItemError>;
}

/// Aggregate result of one run
#[derive(Debug)]
pub struct BatchRun<O> {
    /// Outputs of successful items, in input order
    pub succeeded: Vec<O>,
    pub failed: Vec<FailedItem>,
    /// Number of items actually sent to the service
    pub submitted: usize,
    /// Auth failure that stopped the batch early
    pub aborted: Option<ItemError>,
}

impl<O> Default for BatchRun<O> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            submitted: 0,
            aborted: None,
        }
    }
}

pub struct BatchRunner<'a> {
    pause: Duration,
    progress: &'a ProgressReporter,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pause: Duration, progress: &'a ProgressReporter) -> Self {
        Self { pause, progress }
    }

    pub async fn run<T: BatchTask>(&self, task: &T, items: Vec<T::Item>) -> BatchRun<T::Output> {
        let total = items.len();
        let mut run = BatchRun::default();
        let mut previous_submitted = false;

        for (index, item) in items.into_iter().enumerate() {
            if previous_submitted && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            previous_submitted = false;

            self.progress
                .begin(index + 1, total, task.describe(index + 1, total, &item));
            let label = task.label(&item);

            if let Err(reason) = task.precheck(&item) {
                tracing::warn!(item = %label, %reason, "Rejected before submission");
                run.failed.push(FailedItem::new(label, reason));
                continue;
            }

            previous_submitted = true;
            run.submitted += 1;

            match task.submit(item).await {
                Ok(output) => {
                    tracing::debug!(item = %label, "Item succeeded");
                    run.succeeded.push(output);
                }
                Err(e) if e.is_auth_failure() => {
                    tracing::error!(item = %label, "Auth failure, abandoning batch");
                    run.aborted = Some(e);
                    break;
                }
                Err(e) => {
                    let reason = e.reason();
                    tracing::warn!(item = %label, %reason, "Item failed");
                    run.failed.push(FailedItem::new(label, reason));
                }
            }
        }

        self.progress.finish();
        run
    }
}
