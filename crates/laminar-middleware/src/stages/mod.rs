//! Ready-made middleware.
//!
//! These stages work with any context and result type and can be registered
//! like any user middleware, either as shared handlers or as capability
//! types:
//!
//! - [`logging`] - Log entry, exit and latency of the downstream chain
//! - [`timeout`] - Bound the latency of the downstream chain

pub mod logging;
pub mod timeout;

pub use logging::LoggingMiddleware;
pub use timeout::TimeoutMiddleware;
