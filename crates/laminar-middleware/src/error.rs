//! Error types for chain execution.
//!
//! [`ChainError`] is the single error type that crosses the engine boundary.
//! It distinguishes invariant violations (a programming error in how the
//! engine was assembled) from failures raised by middleware or by the
//! terminal handler.
//!
//! | Variant | Raised by | Swallowed by `continue_on_error`? |
//! |---|---|---|
//! | `MissingMiddleware` | resolver | never |
//! | `InvalidMiddlewareKind` | resolver | never |
//! | `Handler` | middleware | yes |
//! | `Timeout` | middleware | yes |
//! | `Terminal` | terminal handler | never |
//! | `Other` | middleware (before attribution) | yes |

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`ChainError`].
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors produced while executing a middleware chain.
///
/// Middleware return any error through the [`Other`](ChainError::Other)
/// variant (every `anyhow::Error` converts into it). When that error leaves
/// the middleware, the dispatcher attributes it to the middleware's id and
/// turns it into [`Handler`](ChainError::Handler). Errors that already carry
/// an origin pass through unchanged, so the caller of `execute` always sees
/// the first error that was not swallowed.
///
/// # Example
///
/// ```
/// use laminar_middleware::ChainError;
///
/// let err: ChainError = anyhow::anyhow!("token expired").into();
/// assert!(!err.is_invariant_violation());
/// assert_eq!(err.to_string(), "token expired");
/// ```
#[derive(Error, Debug)]
pub enum ChainError {
    /// No definition is stored under the requested id.
    #[error("middleware `{id}` is not registered")]
    MissingMiddleware {
        /// The id that was looked up.
        id: String,
    },

    /// A definition could not be turned into a callable handler.
    #[error("middleware `{id}` could not be resolved to a handler: {reason}")]
    InvalidMiddlewareKind {
        /// The id of the entry being resolved.
        id: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A middleware failed.
    #[error("middleware `{id}` failed: {source}")]
    Handler {
        /// The id of the failing middleware.
        id: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// The downstream chain did not finish in time.
    #[error("downstream chain timed out after {after:?}")]
    Timeout {
        /// The deadline that elapsed.
        after: Duration,
    },

    /// The terminal handler failed.
    #[error("terminal handler failed: {0}")]
    Terminal(#[source] anyhow::Error),

    /// A failure raised inside a middleware that has not been attributed yet.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChainError {
    /// Creates a missing middleware error.
    #[must_use]
    pub fn missing(id: impl Into<String>) -> Self {
        Self::MissingMiddleware { id: id.into() }
    }

    /// Creates an invalid middleware kind error.
    #[must_use]
    pub fn invalid_kind(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMiddlewareKind {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a handler error attributed to `id`.
    #[must_use]
    pub fn handler(id: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Handler {
            id: id.into(),
            source: source.into(),
        }
    }

    /// Creates a terminal handler error.
    #[must_use]
    pub fn terminal(source: impl Into<anyhow::Error>) -> Self {
        Self::Terminal(source.into())
    }

    /// Returns true for programming errors in how the engine was assembled.
    ///
    /// These always abort the current `execute` call.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::MissingMiddleware { .. } | Self::InvalidMiddlewareKind { .. }
        )
    }

    /// Returns true if the error originated in the terminal handler.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Returns true if `continue_on_error` may swallow this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_invariant_violation() && !self.is_terminal()
    }

    /// Returns the id of the middleware this error is attributed to, if any.
    #[must_use]
    pub fn middleware_id(&self) -> Option<&str> {
        match self {
            Self::MissingMiddleware { id }
            | Self::InvalidMiddlewareKind { id, .. }
            | Self::Handler { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Attributes an unattributed failure to the middleware `id`.
    pub(crate) fn attribute(self, id: &str) -> Self {
        match self {
            Self::Other(source) => Self::handler(id, source),
            other => other,
        }
    }
}
