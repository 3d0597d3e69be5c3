//! The poll loop's only suspension point.

use crate::core::ScanError;

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Waits between status polls.
///
/// This is the only place a run observes cancellation: a cancelled token
/// must end the wait with [`ScanError::Cancelled`].
#[async_trait]
pub trait PollSleeper: Send + Sync + Debug {
    /// Waits for `duration` unless `cancel` fires first.
    async fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<(), ScanError>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl PollSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<(), ScanError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
