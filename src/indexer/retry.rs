use backon::{BackoffBuilder, ConstantBackoff, ConstantBuilder};
use std::time::Duration;

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(120);

/// Wait between a failed liveness probe and the next reconnect attempt.
///
/// Index builds are long-running maintenance, so the schedule never runs
/// out: the builder keeps waiting until the server comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    interval: Duration,
}

impl ReconnectPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn schedule(&self) -> ConstantBackoff {
        ConstantBuilder::default()
            .with_delay(self.interval)
            .without_max_times()
            .build()
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_INTERVAL)
    }
}
