use tokio_util::sync::CancellationToken;

/// Caller-held handle that halts the remaining queue of a running batch.
///
/// Stopping is idempotent. An in-flight exchange call is never interrupted;
/// the stop takes effect at the next throttle wait or before the next item.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing token so the batch stops together with a wider shutdown.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`StopHandle::stop`] has been called.
    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
