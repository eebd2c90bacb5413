use super::stop::StopHandle;
use rand::Rng;
use std::time::Duration;
use tokio::task::yield_now;
use tokio::time::sleep;

/// Result of a throttle wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleOutcome {
    Elapsed(Duration),
    Cancelled,
}

/// Randomized, interruptible pause inserted before every exchange call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Throttle;

impl Throttle {
    /// Picks a whole-second delay uniformly from `[min_secs, max_secs]`.
    ///
    /// Callers guarantee `min_secs <= max_secs`; `BatchJob` rejects inverted ranges.
    pub fn pick_delay<R: Rng + ?Sized>(rng: &mut R, min_secs: u64, max_secs: u64) -> Duration {
        debug_assert!(
            min_secs <= max_secs,
            "inverted delay range {min_secs}..={max_secs}"
        );
        let secs = if min_secs >= max_secs {
            min_secs
        } else {
            rng.gen_range(min_secs..=max_secs)
        };
        Duration::from_secs(secs)
    }

    /// Sleeps for a random delay in `[min_secs, max_secs]`, returning early
    /// with [`ThrottleOutcome::Cancelled`] when `stop` fires.
    pub async fn wait(&self, min_secs: u64, max_secs: u64, stop: &StopHandle) -> ThrottleOutcome {
        let delay = Self::pick_delay(&mut rand::thread_rng(), min_secs, max_secs);
        self.wait_for(delay, stop).await
    }

    /// Sleeps for exactly `delay` unless `stop` fires first.
    pub async fn wait_for(&self, delay: Duration, stop: &StopHandle) -> ThrottleOutcome {
        if stop.is_stopped() {
            return ThrottleOutcome::Cancelled;
        }

        if delay.is_zero() {
            yield_now().await;
            return if stop.is_stopped() {
                ThrottleOutcome::Cancelled
            } else {
                ThrottleOutcome::Elapsed(delay)
            };
        }

        tracing::debug!(delay_secs = delay.as_secs(), "throttling before next withdrawal");

        tokio::select! {
            _ = stop.stopped() => ThrottleOutcome::Cancelled,
            _ = sleep(delay) => ThrottleOutcome::Elapsed(delay),
        }
    }
}
