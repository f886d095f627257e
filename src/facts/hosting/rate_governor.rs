use super::client::RateLimitInfo;
use core::time::Duration;

const LOG_TARGET: &str = "     quota";

/// Keeps API quota from running dry.
///
/// Every successful page fetch reports its remaining quota here. Once the
/// quota dips under the low-water mark, the caller is held back for a fixed
/// cool-down before it may issue its next request. The governor carries no
/// mutable state, so any number of tasks can share it.
#[derive(Debug, Clone, Copy)]
pub struct RateGovernor {
    low_water_mark: usize,
    cooldown: Duration,
}

impl RateGovernor {
    #[must_use]
    pub const fn new(low_water_mark: usize, cooldown: Duration) -> Self {
        Self { low_water_mark, cooldown }
    }

    #[must_use]
    pub const fn low_water_mark(&self) -> usize {
        self.low_water_mark
    }

    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether the given quota signal warrants a pause.
    #[must_use]
    pub const fn must_pause(&self, info: &RateLimitInfo) -> bool {
        info.remaining < self.low_water_mark
    }

    /// Consume the quota signal of one response, sleeping through the cool-down if quota is low.
    ///
    /// Responses without quota headers carry no signal and never cause a pause.
    pub async fn observe(&self, info: Option<RateLimitInfo>) {
        let Some(info) = info else {
            return;
        };

        if self.must_pause(&info) {
            log::info!(
                target: LOG_TARGET,
                "API quota low ({} remaining, resets at {}), pausing for {}s",
                info.remaining,
                info.reset_at.with_timezone(&chrono::Local).format("%T"),
                self.cooldown.as_secs()
            );
            tokio::time::sleep(self.cooldown).await;
        }
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(5))
    }
}
