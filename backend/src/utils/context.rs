use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DiscoveryError;

/// Per-operation lifetime: a cancellation token plus an optional deadline.
/// Every store and cache call made on behalf of a request goes through
/// [`RequestContext::guard`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_token(cancel: CancellationToken) -> Self {
        Self { cancel, deadline: None }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the termination error if the token fired or the deadline passed.
    pub fn check(&self) -> Result<(), DiscoveryError> {
        if self.cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(DiscoveryError::TimedOut);
        }
        Ok(())
    }

    /// Races `fut` against cancellation and the deadline.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, DiscoveryError>
    where
        F: Future<Output = Result<T, DiscoveryError>>,
    {
        self.check()?;
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DiscoveryError::Cancelled),
            _ = expired => Err(DiscoveryError::TimedOut),
            result = fut => result,
        }
    }
}
