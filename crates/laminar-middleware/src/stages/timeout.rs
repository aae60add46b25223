//! Deadline middleware.
//!
//! Bounds how long the downstream chain (every later middleware and the
//! terminal handler) may take. When the deadline passes the downstream
//! future is dropped and [`ChainError::Timeout`] is returned.
//!
//! Dropping the downstream future cancels it at its current await point.
//! Entries it had started show up as failed in the trace.

use crate::error::{ChainError, ChainResult};
use crate::middleware::{BoxFuture, Middleware, Next};
use std::time::Duration;
use tracing::warn;

/// Middleware that enforces a deadline on the downstream chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutMiddleware {
    after: Duration,
}

impl TimeoutMiddleware {
    /// Deadline used by [`Default`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a timeout middleware.
    #[must_use]
    pub const fn new(after: Duration) -> Self {
        Self { after }
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn after(&self) -> Duration {
        self.after
    }
}

impl Default for TimeoutMiddleware {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl<C, R> Middleware<C, R> for TimeoutMiddleware
where
    C: Send + 'static,
    R: Send + 'static,
{
    fn process<'a>(
        &'a self,
        ctx: &'a mut C,
        next: Next<'a, C, R>,
    ) -> BoxFuture<'a, ChainResult<R>> {
        Box::pin(async move {
            match tokio::time::timeout(self.after, next.run(ctx)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?self.after, "downstream chain timed out");
                    Err(ChainError::Timeout { after: self.after })
                }
            }
        })
    }
}
