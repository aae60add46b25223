//! Structured logging middleware.
//!
//! Emits one `debug` event when the downstream chain is entered and one when
//! it returns, carrying the elapsed time. Failures are logged at `warn` and
//! returned unchanged.
//!
//! # Example
//!
//! ```
//! use laminar_middleware::stages::LoggingMiddleware;
//! use laminar_middleware::{MiddlewareDefinition, MiddlewareEngine, RegisterOptions};
//!
//! let engine = MiddlewareEngine::<(), ()>::new();
//! engine.register(
//!     "logging",
//!     MiddlewareDefinition::handler(LoggingMiddleware::new("checkout")),
//!     RegisterOptions::new().priority(0).global(true),
//! );
//! ```

use crate::error::ChainResult;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::trace::duration_ms;
use std::time::Instant;
use tracing::{debug, warn};

/// Middleware that logs the downstream chain.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    /// Label attached to every event.
    label: String,
}

impl LoggingMiddleware {
    /// Label used by [`Default`].
    pub const DEFAULT_LABEL: &'static str = "chain";

    /// Creates a logging middleware with the given label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns the label attached to events.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LABEL)
    }
}

impl<C, R> Middleware<C, R> for LoggingMiddleware
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
            let remaining = next.remaining();
            debug!(label = %self.label, remaining, "entering chain");

            let start = Instant::now();
            let result = next.run(ctx).await;
            let elapsed = duration_ms(start.elapsed());

            match &result {
                Ok(_) => debug!(label = %self.label, duration_ms = elapsed, "chain completed"),
                Err(err) => warn!(
                    label = %self.label,
                    duration_ms = elapsed,
                    error = %err,
                    "chain failed"
                ),
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MiddlewareDefinition, MiddlewareEngine, RegisterOptions};

    #[test]
    fn test_default_label() {
        assert_eq!(LoggingMiddleware::default().label(), "chain");
        assert_eq!(LoggingMiddleware::new("api").label(), "api");
    }

    #[tokio::test]
    async fn test_passes_result_through() {
        let engine = MiddlewareEngine::<u32, u32>::new();
        engine.register(
            "logging",
            MiddlewareDefinition::handler(LoggingMiddleware::default()),
            RegisterOptions::new(),
        );

        let mut ctx = 20;
        let envelope = engine
            .execute(&mut ctx, &["logging"], increment)
            .await
            .unwrap();

        assert_eq!(envelope.result, 21);
        assert!(envelope.modified);
    }

    #[tokio::test]
    async fn test_passes_error_through() {
        let engine = MiddlewareEngine::<(), ()>::new();
        engine.register(
            "logging",
            MiddlewareDefinition::<(), ()>::capability_type::<LoggingMiddleware>(),
            RegisterOptions::new(),
        );

        let err = engine
            .execute(&mut (), &["logging"], fail_terminal)
            .await
            .unwrap_err();

        assert!(err.is_terminal());
    }

    fn increment(ctx: &mut u32) -> BoxFuture<'_, anyhow::Result<u32>> {
        Box::pin(async move { Ok(*ctx + 1) })
    }

    fn fail_terminal(_ctx: &mut ()) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async { Err(anyhow::anyhow!("unavailable")) })
    }
}
