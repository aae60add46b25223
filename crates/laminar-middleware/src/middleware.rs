//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every handler in a chain
//! implements, the [`Next`] continuation handed to it, and the two ways a
//! middleware can be registered ([`MiddlewareDefinition`]).
//!
//! # Onion Model
//!
//! Each middleware wraps the rest of the chain. It may run code before
//! calling `next`, inspect or replace the result `next` produced, and run
//! code after:
//!
//! ```text
//! auth ─▶ logging ─▶ validation ─▶ terminal
//!  ◀────────◀─────────────◀──────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use laminar_middleware::{BoxFuture, ChainResult, Middleware, Next};
//!
//! struct Audit;
//!
//! impl Middleware<Vec<String>, String> for Audit {
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut Vec<String>,
//!         next: Next<'a, Vec<String>, String>,
//!     ) -> BoxFuture<'a, ChainResult<String>> {
//!         Box::pin(async move {
//!             ctx.push("audit:before".to_string());
//!             let result = next.run(ctx).await;
//!             ctx.push("audit:after".to_string());
//!             result
//!         })
//!     }
//! }
//! ```

use crate::dispatch::Dispatch;
use crate::error::ChainResult;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that returns `T`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware that can be shared across chains.
pub type BoxedMiddleware<C, R> = Arc<dyn Middleware<C, R>>;

/// The core middleware trait.
///
/// `C` is the caller-owned context threaded through the chain by mutable
/// reference; `R` is the result produced by the terminal handler. The engine
/// never looks inside either.
///
/// # Invariants
///
/// - `next` can be run at most once: [`Next::run`] consumes it
/// - Not running `next` short-circuits the chain; the middleware's own
///   result becomes the result of everything outside it
pub trait Middleware<C, R>: Send + Sync + 'static {
    /// Processes the context, optionally delegating to the rest of the chain.
    fn process<'a>(
        &'a self,
        ctx: &'a mut C,
        next: Next<'a, C, R>,
    ) -> BoxFuture<'a, ChainResult<R>>;
}

/// Continuation that runs the rest of the chain.
///
/// A `Next` belongs to one chain invocation and picks up wherever that
/// invocation's dispatch has reached. Running it consumes it, so a
/// middleware cannot delegate twice.
pub struct Next<'a, C, R> {
    dispatch: &'a Dispatch<'a, C, R>,
    index: usize,
}

impl<'a, C, R> Next<'a, C, R>
where
    C: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(dispatch: &'a Dispatch<'a, C, R>) -> Self {
        Self {
            index: dispatch.position(),
            dispatch,
        }
    }

    /// Runs the following middleware, or the terminal handler once the
    /// chain is exhausted, and returns its eventual result.
    pub async fn run(self, ctx: &mut C) -> ChainResult<R> {
        self.dispatch.dispatch(ctx).await
    }

    /// Returns the chain position that was next when this continuation
    /// was handed out.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }

    /// Returns how many middleware remain before the terminal handler.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.dispatch.len().saturating_sub(self.index)
    }
}

impl<C, R> fmt::Debug for Next<'_, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("index", &self.index).finish()
    }
}

/// A middleware that can be created from a closure.
///
/// # Example
///
/// ```
/// use laminar_middleware::MiddlewareDefinition;
///
/// let definition = MiddlewareDefinition::<u32, u32>::function(|ctx, next| {
///     Box::pin(async move {
///         *ctx += 1;
///         next.run(ctx).await
///     })
/// });
/// assert!(definition.is_function());
/// ```
pub struct FnMiddleware<F> {
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Wraps a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<C, R, F> Middleware<C, R> for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut C, Next<'a, C, R>) -> BoxFuture<'a, ChainResult<R>>
        + Send
        + Sync
        + 'static,
{
    fn process<'a>(
        &'a self,
        ctx: &'a mut C,
        next: Next<'a, C, R>,
    ) -> BoxFuture<'a, ChainResult<R>> {
        (self.func)(ctx, next)
    }
}

/// Produces a fresh middleware instance for every resolution.
///
/// Implemented for any `Fn() -> M` where `M: Middleware`, so a constructor
/// such as `RateLimiter::default` can be registered directly. Implement it
/// by hand when construction can fail.
pub trait MiddlewareFactory<C, R>: Send + Sync + 'static {
    /// Builds a new handler instance.
    ///
    /// Failing here aborts the current execution with
    /// [`ChainError::InvalidMiddlewareKind`](crate::ChainError::InvalidMiddlewareKind).
    fn instantiate(&self) -> Result<Box<dyn Middleware<C, R>>, String>;
}

impl<C, R, F, M> MiddlewareFactory<C, R> for F
where
    F: Fn() -> M + Send + Sync + 'static,
    M: Middleware<C, R>,
{
    fn instantiate(&self) -> Result<Box<dyn Middleware<C, R>>, String> {
        Ok(Box::new(self()))
    }
}

/// How a middleware was registered.
///
/// The variant is chosen at registration time, so resolution never has to
/// inspect a definition to decide what it is.
pub enum MiddlewareDefinition<C, R> {
    /// A handler used as-is on every execution. Any state it holds is shared
    /// by all executions.
    Function(BoxedMiddleware<C, R>),

    /// A capability type: a new instance is created for every resolution,
    /// i.e. once per chain position per execution. Nothing stored in the
    /// instance survives into another execution; share state through the
    /// context instead.
    Capability(Arc<dyn MiddlewareFactory<C, R>>),
}

/// The kind of a [`MiddlewareDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiddlewareKind {
    /// Shared handler.
    Function,
    /// Per-resolution instance.
    Capability,
}

impl fmt::Display for MiddlewareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => f.write_str("function"),
            Self::Capability => f.write_str("capability"),
        }
    }
}

impl<C, R> MiddlewareDefinition<C, R> {
    /// Registers a closure as a shared function handler.
    pub fn function<F>(func: F) -> Self
    where
        F: for<'a> Fn(&'a mut C, Next<'a, C, R>) -> BoxFuture<'a, ChainResult<R>>
            + Send
            + Sync
            + 'static,
    {
        Self::Function(Arc::new(FnMiddleware::new(func)))
    }

    /// Registers an existing middleware value as a shared function handler.
    pub fn handler<M>(middleware: M) -> Self
    where
        M: Middleware<C, R>,
    {
        Self::Function(Arc::new(middleware))
    }

    /// Registers a factory as a capability type.
    pub fn capability<F>(factory: F) -> Self
    where
        F: MiddlewareFactory<C, R>,
    {
        Self::Capability(Arc::new(factory))
    }

    /// Registers a `Default`-constructible middleware type as a capability type.
    ///
    /// # Example
    ///
    /// ```
    /// use laminar_middleware::stages::LoggingMiddleware;
    /// use laminar_middleware::MiddlewareDefinition;
    ///
    /// let definition = MiddlewareDefinition::<(), ()>::capability_type::<LoggingMiddleware>();
    /// assert!(!definition.is_function());
    /// ```
    pub fn capability_type<M>() -> Self
    where
        M: Middleware<C, R> + Default,
    {
        Self::capability(M::default)
    }

    /// Returns the kind of this definition.
    #[must_use]
    pub const fn kind(&self) -> MiddlewareKind {
        match self {
            Self::Function(_) => MiddlewareKind::Function,
            Self::Capability(_) => MiddlewareKind::Capability,
        }
    }

    /// Returns true for shared function handlers.
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

impl<C, R> Clone for MiddlewareDefinition<C, R> {
    fn clone(&self) -> Self {
        match self {
            Self::Function(handler) => Self::Function(Arc::clone(handler)),
            Self::Capability(factory) => Self::Capability(Arc::clone(factory)),
        }
    }
}

impl<C, R> fmt::Debug for MiddlewareDefinition<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MiddlewareDefinition")
            .field(&self.kind())
            .finish()
    }
}
