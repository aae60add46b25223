//! # Laminar Middleware
//!
//! Onion-model middleware execution engine.
//!
//! Middleware are registered under string ids, each with a priority and a
//! global flag. Every execution builds a chain from all global middleware
//! plus the requested targets, orders it by ascending priority, and runs a
//! caller-owned context through it to a terminal handler. Each middleware
//! decides whether and when to delegate to the rest of the chain.
//!
//! ```text
//!  execute(ctx, ["auth", "audit"], terminal)
//!
//!  global_0 (p=0) ─▶ auth (p=10) ─▶ audit (p=1000) ─▶ terminal
//!       ◀──────────────◀────────────────◀────────────────┘
//! ```
//!
//! ## Components
//!
//! | Component | Module | Purpose |
//! |-----------|--------|---------|
//! | Registry | [`registry`] | Id-keyed entries with priority, global flag, metadata |
//! | Resolver | internal | Definition to handler; fresh capability instances |
//! | Chain Builder | [`chain`] | Globals plus targets, stable priority sort |
//! | Dispatcher | internal | `next` continuation, terminal, failure policy |
//! | Tracer | [`trace`] | Per-middleware timing, registry stats, metrics |
//! | Engine | [`engine`] | Facade owning registry and options |
//!
//! ## Failure Policy
//!
//! With `continue_on_error` off, the first middleware failure aborts the
//! execution. With it on, a failed middleware is recorded and dispatch
//! resumes wherever it had reached, so no middleware runs twice. Terminal
//! failures and resolution failures always propagate. See [`ChainError`].
//!
//! ## Example
//!
//! ```
//! use laminar_middleware::{
//!     BoxFuture, ConfigureOptions, MiddlewareDefinition, MiddlewareEngine, RegisterOptions,
//! };
//!
//! fn total(items: &mut Vec<u32>) -> BoxFuture<'_, anyhow::Result<u32>> {
//!     Box::pin(async move { Ok(items.iter().sum()) })
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = MiddlewareEngine::<Vec<u32>, u32>::new();
//! engine.configure(
//!     ConfigureOptions::new()
//!         .enable_trace(true)
//!         .global(MiddlewareDefinition::<Vec<u32>, u32>::function(|items, next| {
//!             Box::pin(async move {
//!                 items.retain(|item| *item > 0);
//!                 next.run(items).await
//!             })
//!         })),
//! );
//! engine.register_fn(
//!     "double",
//!     |items, next| Box::pin(async move {
//!         next.run(items).await.map(|sum| sum * 2)
//!     }),
//!     RegisterOptions::new().priority(10),
//! );
//!
//! let mut items = vec![0, 1, 2];
//! let envelope = engine.execute(&mut items, &["double"], total).await.unwrap();
//!
//! assert_eq!(envelope.result, 6);
//! let names: Vec<_> = envelope.trace.unwrap().into_iter().map(|e| e.name).collect();
//! assert_eq!(names, vec!["global_0", "double"]);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/laminar-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
mod dispatch;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod registry;
mod resolver;
pub mod stages;
pub mod trace;

// Re-export main types at crate root
pub use crate::chain::Chain;
pub use crate::dispatch::Terminal;
pub use crate::engine::{
    ConfigureOptions, EngineOptions, ExecutionEnvelope, MiddlewareEngine, GLOBAL_ID_PREFIX,
};
pub use crate::error::{ChainError, ChainResult};
pub use crate::middleware::{
    BoxFuture, BoxedMiddleware, FnMiddleware, Middleware, MiddlewareDefinition, MiddlewareFactory,
    MiddlewareKind, Next,
};
pub use crate::registry::{
    Metadata, MiddlewareEntry, RegisterOptions, Registry, DEFAULT_PRIORITY,
};
pub use crate::trace::{RegistryStats, TraceEntry, FAILED_SUFFIX};
