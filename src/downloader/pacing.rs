//! Request pacing between windows
//!
//! The range processor waits on a [`Pacer`] after every window, whatever the
//! outcome, to bound the request rate against the remote service.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

use super::config::PACING_DELAY;

/// Pacing policy applied between consecutive windows
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait before the next window
    async fn pause(&self);

    /// Nominal delay, for logging
    fn delay(&self) -> Duration;
}

/// Sleep for a fixed duration between windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Create a pacer with the given delay
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(PACING_DELAY)
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    fn delay(&self) -> Duration {
        self.delay
    }
}

/// No pacing at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}

    fn delay(&self) -> Duration {
        Duration::ZERO
    }
}
