//! The pause between two status polls of a run.

use std::time::Duration;

use async_trait::async_trait;

/// Default pause between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Supplies the pause between two polls of a running playbook.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits before the next poll.
    async fn pause(&self);
}

/// Sleeps for [`POLL_INTERVAL`] on the tokio timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval(Duration);

impl FixedInterval {
    pub fn interval(self) -> Duration {
        self.0
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self(POLL_INTERVAL)
    }
}

#[async_trait]
impl Pacer for FixedInterval {
    async fn pause(&self) {
        tokio::time::sleep(self.0).await;
    }
}

/// Polls back to back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPause;

#[async_trait]
impl Pacer for NoPause {
    async fn pause(&self) {}
}
