//! Onion-style dispatch over a built chain.
//!
//! One invocation keeps a single cursor. Each dispatch takes the entry at
//! the cursor, advances it, and hands the entry a [`Next`] that dispatches
//! again. Once the cursor reaches the end of the chain the terminal handler
//! runs. Control returns outward through each middleware as the futures
//! complete.
//!
//! A failure swallowed under `continue_on_error` resumes from the cursor,
//! so middleware that already ran below the failed one are never run twice.
//! If the failed middleware had already delegated, the cursor sits at the
//! end and only the terminal handler runs again to produce the result.

use crate::chain::Chain;
use crate::error::{ChainError, ChainResult};
use crate::middleware::{BoxFuture, Next};
use crate::resolver;
use crate::trace::{TraceEntry, TraceRecorder};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// The innermost handler of a chain.
///
/// Implemented for closures of the shape
/// `|ctx| Box::pin(async move { ... })`. Its errors are reported as
/// [`ChainError::Terminal`] and are never swallowed.
pub trait Terminal<C, R>: Send + Sync {
    /// Produces the chain's result.
    fn call<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, anyhow::Result<R>>;
}

impl<C, R, F> Terminal<C, R> for F
where
    F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, anyhow::Result<R>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, anyhow::Result<R>> {
        self(ctx)
    }
}

/// State of one chain invocation.
pub(crate) struct Dispatch<'a, C, R> {
    chain: &'a Chain<C, R>,
    terminal: &'a dyn Terminal<C, R>,
    continue_on_error: bool,
    cursor: AtomicUsize,
    recorder: TraceRecorder,
}

impl<'a, C, R> Dispatch<'a, C, R>
where
    C: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(
        chain: &'a Chain<C, R>,
        terminal: &'a dyn Terminal<C, R>,
        continue_on_error: bool,
    ) -> Self {
        Self {
            chain,
            terminal,
            continue_on_error,
            cursor: AtomicUsize::new(0),
            recorder: TraceRecorder::new(),
        }
    }

    /// Number of middleware in the chain.
    pub(crate) fn len(&self) -> usize {
        self.chain.len()
    }

    /// Position of the next entry to run.
    pub(crate) fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Takes the position at the cursor, advancing it unless the chain is
    /// already exhausted.
    fn advance(&self) -> usize {
        let len = self.len();
        let taken = self.cursor.fetch_update(Ordering::AcqRel, Ordering::Acquire, |index| {
            (index < len).then_some(index + 1)
        });
        let (Ok(index) | Err(index)) = taken;
        index
    }

    /// Runs the chain from the cursor onward.
    pub(crate) fn dispatch<'b>(&'b self, ctx: &'b mut C) -> BoxFuture<'b, ChainResult<R>> {
        Box::pin(async move {
            let index = self.advance();
            let Some(entry) = self.chain.get(index) else {
                debug!(
                    order = index,
                    "chain exhausted, invoking terminal handler"
                );
                return self
                    .terminal
                    .call(ctx)
                    .await
                    .map_err(ChainError::Terminal);
            };

            let id = entry.id();
            let handler = resolver::resolve(id, entry.definition())?;

            debug!(
                middleware = id,
                order = index,
                priority = entry.priority(),
                "invoking middleware"
            );

            let slot = self.recorder.start(id, index);
            let outcome = handler.process(ctx, Next::new(self)).await;

            match outcome {
                Ok(result) => {
                    self.recorder.complete(slot);
                    Ok(result)
                }
                Err(err) => {
                    let err = err.attribute(id);
                    self.recorder.fail(slot);

                    if self.continue_on_error && err.is_recoverable() {
                        warn!(
                            middleware = id,
                            order = index,
                            error = %err,
                            "middleware failed, continuing with the rest of the chain"
                        );
                        self.dispatch(ctx).await
                    } else {
                        Err(err)
                    }
                }
            }
        })
    }

    /// Consumes the invocation state, returning its trace records.
    pub(crate) fn into_trace(self) -> Vec<TraceEntry> {
        self.recorder.into_entries()
    }
}
