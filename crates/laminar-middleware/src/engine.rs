//! The middleware engine facade.
//!
//! [`MiddlewareEngine`] owns the registry and the standing options and runs
//! executions. It is shared by reference (typically in an `Arc`); every
//! method takes `&self`. Locks are held only while the registry or options
//! are read or written, never across an await, so registry changes made
//! during an execution apply to the next one.
//!
//! # Example
//!
//! ```
//! use laminar_middleware::{BoxFuture, ConfigureOptions, MiddlewareEngine, RegisterOptions};
//!
//! fn greet(name: &mut String) -> BoxFuture<'_, anyhow::Result<String>> {
//!     Box::pin(async move { Ok(format!("hello, {name}")) })
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = MiddlewareEngine::<String, String>::new();
//! engine.configure(ConfigureOptions::new().enable_trace(true));
//! engine.register_fn(
//!     "uppercase",
//!     |ctx, next| Box::pin(async move {
//!         *ctx = ctx.to_uppercase();
//!         next.run(ctx).await
//!     }),
//!     RegisterOptions::new(),
//! );
//!
//! let mut name = "ada".to_string();
//! let envelope = engine.execute(&mut name, &["uppercase"], greet).await.unwrap();
//!
//! assert_eq!(envelope.result, "hello, ADA");
//! assert!(envelope.modified);
//! assert_eq!(envelope.trace.unwrap()[0].name, "uppercase");
//! # }
//! ```

use crate::chain::Chain;
use crate::dispatch::{Dispatch, Terminal};
use crate::error::{ChainError, ChainResult};
use crate::middleware::{BoxFuture, BoxedMiddleware, MiddlewareDefinition, Next};
use crate::registry::{RegisterOptions, Registry};
use crate::resolver;
use crate::trace::{duration_ms, RegistryStats, TraceEntry};
use laminar_config::EngineConfig;
use laminar_telemetry::metrics::{self as telemetry_metrics, Outcome};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

/// Prefix of the ids given to middleware passed in [`ConfigureOptions::global`].
pub const GLOBAL_ID_PREFIX: &str = "global_";

/// Standing options applied to every execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Return per-middleware records in the envelope.
    pub enable_trace: bool,
    /// Swallow middleware failures and resume wherever dispatch had reached.
    pub continue_on_error: bool,
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            enable_trace: config.engine.enable_trace,
            continue_on_error: config.engine.continue_on_error,
        }
    }
}

/// A partial update of the engine options plus middleware to register
/// globally.
///
/// Unset flags leave the current value unchanged.
pub struct ConfigureOptions<C, R> {
    /// New value for [`EngineOptions::enable_trace`].
    pub enable_trace: Option<bool>,
    /// New value for [`EngineOptions::continue_on_error`].
    pub continue_on_error: Option<bool>,
    /// Middleware registered as `global_<position>` with
    /// `priority = position`.
    pub global: Vec<MiddlewareDefinition<C, R>>,
}

impl<C, R> ConfigureOptions<C, R> {
    /// Creates an update that changes nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enable_trace: None,
            continue_on_error: None,
            global: Vec::new(),
        }
    }

    /// Sets `enable_trace`.
    #[must_use]
    pub const fn enable_trace(mut self, enabled: bool) -> Self {
        self.enable_trace = Some(enabled);
        self
    }

    /// Sets `continue_on_error`.
    #[must_use]
    pub const fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = Some(enabled);
        self
    }

    /// Appends one global middleware.
    #[must_use]
    pub fn global(mut self, definition: MiddlewareDefinition<C, R>) -> Self {
        self.global.push(definition);
        self
    }
}

impl<C, R> Default for ConfigureOptions<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> From<&EngineConfig> for ConfigureOptions<C, R> {
    fn from(config: &EngineConfig) -> Self {
        Self::new()
            .enable_trace(config.engine.enable_trace)
            .continue_on_error(config.engine.continue_on_error)
    }
}

impl<C, R> fmt::Debug for ConfigureOptions<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureOptions")
            .field("enable_trace", &self.enable_trace)
            .field("continue_on_error", &self.continue_on_error)
            .field("global", &self.global.len())
            .finish()
    }
}

/// The outcome of a successful execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEnvelope<R> {
    /// What the chain produced.
    pub result: R,
    /// Wall-clock time of the whole execution.
    pub execution_time_ms: f64,
    /// True iff at least one middleware ran.
    pub modified: bool,
    /// Per-middleware records, present only when tracing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceEntry>>,
}

/// Registry, options and execution entry point.
pub struct MiddlewareEngine<C, R> {
    registry: RwLock<Registry<C, R>>,
    options: RwLock<EngineOptions>,
}

impl<C, R> MiddlewareEngine<C, R>
where
    C: Send + 'static,
    R: Send + 'static,
{
    /// Creates an engine with no middleware, tracing off and
    /// `continue_on_error` off.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Creates an engine with the given options.
    #[must_use]
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            options: RwLock::new(options),
        }
    }

    /// Creates an engine from loaded configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_options(EngineOptions::from(config))
    }

    /// Stores `definition` under `id`, replacing any previous entry.
    ///
    /// Returns `true` if an entry was replaced.
    pub fn register(
        &self,
        id: impl Into<String>,
        definition: MiddlewareDefinition<C, R>,
        options: RegisterOptions,
    ) -> bool {
        self.registry.write().register(id, definition, options)
    }

    /// Registers a closure as a function handler.
    pub fn register_fn<F>(&self, id: impl Into<String>, func: F, options: RegisterOptions) -> bool
    where
        F: for<'a> Fn(&'a mut C, Next<'a, C, R>) -> BoxFuture<'a, ChainResult<R>>
            + Send
            + Sync
            + 'static,
    {
        self.register(id, MiddlewareDefinition::function(func), options)
    }

    /// Removes the entry stored under `id`. Returns `true` if it existed.
    pub fn unregister(&self, id: &str) -> bool {
        self.registry.write().unregister(id)
    }

    /// Returns all registered ids in registration order.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<String> {
        self.registry.read().registered_ids()
    }

    /// Removes every entry. Options are kept.
    pub fn clear(&self) {
        self.registry.write().clear();
    }

    /// Returns counts of total, global and specific entries.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.registry.read().stats()
    }

    /// Resolves the entry registered under `id` into a handler.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::MissingMiddleware`] if nothing is registered
    /// under `id`, or [`ChainError::InvalidMiddlewareKind`] if its capability
    /// factory fails.
    pub fn resolve(&self, id: &str) -> ChainResult<BoxedMiddleware<C, R>> {
        let registry = self.registry.read();
        let entry = registry.get(id).ok_or_else(|| ChainError::missing(id))?;
        resolver::resolve(id, entry.definition())
    }

    /// Builds the chain an execution for `target_ids` would run.
    #[must_use]
    pub fn build_chain<S: AsRef<str>>(&self, target_ids: &[S]) -> Chain<C, R> {
        Chain::build(&self.registry.read(), target_ids)
    }

    /// Applies an options update and registers the given globals.
    ///
    /// The middleware at position `i` of `options.global` is stored as
    /// `global_<i>` with priority `i`, replacing any entry with that id.
    pub fn configure(&self, options: ConfigureOptions<C, R>) {
        let ConfigureOptions {
            enable_trace,
            continue_on_error,
            global,
        } = options;

        let updated = {
            let mut current = self.options.write();
            if let Some(enabled) = enable_trace {
                current.enable_trace = enabled;
            }
            if let Some(enabled) = continue_on_error {
                current.continue_on_error = enabled;
            }
            *current
        };

        let globals = global.len();
        if globals > 0 {
            let mut registry = self.registry.write();
            for (position, definition) in global.into_iter().enumerate() {
                let priority = i64::try_from(position).unwrap_or(i64::MAX);
                registry.register(
                    format!("{GLOBAL_ID_PREFIX}{position}"),
                    definition,
                    RegisterOptions::new().priority(priority).global(true),
                );
            }
        }

        info!(
            enable_trace = updated.enable_trace,
            continue_on_error = updated.continue_on_error,
            globals,
            "middleware engine configured"
        );
    }

    /// Returns the current options.
    #[must_use]
    pub fn options(&self) -> EngineOptions {
        *self.options.read()
    }

    /// Runs `ctx` through every global middleware plus `target_ids`, then
    /// through `terminal`.
    ///
    /// # Errors
    ///
    /// Returns the first error that was not swallowed: a middleware failure
    /// (unless `continue_on_error` is on), a terminal failure, or a
    /// resolution failure.
    pub async fn execute<S, T>(
        &self,
        ctx: &mut C,
        target_ids: &[S],
        terminal: T,
    ) -> ChainResult<ExecutionEnvelope<R>>
    where
        S: AsRef<str> + Sync,
        T: for<'a> Fn(&'a mut C) -> BoxFuture<'a, anyhow::Result<R>> + Send + Sync,
    {
        self.execute_with(ctx, target_ids, &terminal).await
    }

    /// Like [`execute`](Self::execute), taking any [`Terminal`].
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_with<S>(
        &self,
        ctx: &mut C,
        target_ids: &[S],
        terminal: &dyn Terminal<C, R>,
    ) -> ChainResult<ExecutionEnvelope<R>>
    where
        S: AsRef<str> + Sync,
    {
        let options = self.options();
        let chain = self.build_chain(target_ids);
        let start = Instant::now();

        let dispatch = Dispatch::new(&chain, terminal, options.continue_on_error);
        let result = dispatch.dispatch(ctx).await;
        let elapsed = start.elapsed();
        let trace = dispatch.into_trace();

        match result {
            Ok(result) => {
                telemetry_metrics::record_execution(Outcome::Completed, elapsed);
                debug!(
                    chain_len = chain.len(),
                    invocations = trace.len(),
                    duration_ms = duration_ms(elapsed),
                    "execution completed"
                );

                Ok(ExecutionEnvelope {
                    result,
                    execution_time_ms: duration_ms(elapsed),
                    modified: !trace.is_empty(),
                    trace: options.enable_trace.then_some(trace),
                })
            }
            Err(err) => {
                telemetry_metrics::record_execution(Outcome::Failed, elapsed);
                debug!(
                    chain_len = chain.len(),
                    duration_ms = duration_ms(elapsed),
                    error = %err,
                    "execution failed"
                );
                Err(err)
            }
        }
    }
}

impl<C, R> Default for MiddlewareEngine<C, R>
where
    C: Send + 'static,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> fmt::Debug for MiddlewareEngine<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEngine")
            .field("registry", &*self.registry.read())
            .field("options", &*self.options.read())
            .finish()
    }
}
