//! Storage for registered middleware.
//!
//! The [`Registry`] maps ids to [`MiddlewareEntry`] values. Iteration
//! follows registration order, which is what makes the stable priority sort
//! in [`Chain::build`](crate::Chain::build) deterministic for equal
//! priorities. Re-registering an id replaces its entry in place.

use crate::middleware::MiddlewareDefinition;
use crate::trace::RegistryStats;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Priority given to entries registered without one.
pub const DEFAULT_PRIORITY: i64 = 1000;

/// Free-form metadata attached to an entry.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A registered middleware.
pub struct MiddlewareEntry<C, R> {
    id: String,
    definition: MiddlewareDefinition<C, R>,
    priority: i64,
    global: bool,
    metadata: Metadata,
}

impl<C, R> MiddlewareEntry<C, R> {
    /// Returns the id this entry is registered under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the handler definition.
    #[must_use]
    pub const fn definition(&self) -> &MiddlewareDefinition<C, R> {
        &self.definition
    }

    /// Returns the ordering key; lower values run first (outermost).
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// Returns true if the entry is applied to every execution.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.global
    }

    /// Returns the metadata stored with the entry.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl<C, R> fmt::Debug for MiddlewareEntry<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("id", &self.id)
            .field("kind", &self.definition.kind())
            .field("priority", &self.priority)
            .field("global", &self.global)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Options accepted by [`Registry::register`].
///
/// # Example
///
/// ```
/// use laminar_middleware::RegisterOptions;
///
/// let options = RegisterOptions::new().priority(10).global(true);
/// assert_eq!(options.priority, 10);
/// assert!(options.global);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterOptions {
    /// Ordering key; lower values run first.
    pub priority: i64,
    /// Apply the entry to every execution.
    pub global: bool,
    /// Free-form metadata. Stored, never interpreted.
    pub metadata: Metadata,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            global: false,
            metadata: Metadata::new(),
        }
    }
}

impl RegisterOptions {
    /// Creates options with the default priority, not global, no metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority.
    #[must_use]
    pub const fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the entry as global.
    #[must_use]
    pub const fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Adds one metadata value.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Id-keyed store of middleware entries.
///
/// # Example
///
/// ```
/// use laminar_middleware::{MiddlewareDefinition, RegisterOptions, Registry};
///
/// let mut registry = Registry::<u32, u32>::new();
/// registry.register(
///     "double",
///     MiddlewareDefinition::<u32, u32>::function(|ctx, next| {
///         Box::pin(async move {
///             *ctx *= 2;
///             next.run(ctx).await
///         })
///     }),
///     RegisterOptions::new().priority(5),
/// );
///
/// assert_eq!(registry.registered_ids(), vec!["double".to_string()]);
/// assert_eq!(registry.stats().specific, 1);
/// ```
pub struct Registry<C, R> {
    entries: IndexMap<String, Arc<MiddlewareEntry<C, R>>>,
}

impl<C, R> Registry<C, R> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Stores `definition` under `id`.
    ///
    /// An existing entry with the same id is replaced and keeps its
    /// registration position. Returns `true` if an entry was replaced.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        definition: MiddlewareDefinition<C, R>,
        options: RegisterOptions,
    ) -> bool {
        let id = id.into();
        let entry = MiddlewareEntry {
            id: id.clone(),
            definition,
            priority: options.priority,
            global: options.global,
            metadata: options.metadata,
        };

        debug!(
            middleware = %entry.id,
            kind = %entry.definition.kind(),
            priority = entry.priority,
            global = entry.global,
            "registering middleware"
        );

        self.entries.insert(id, Arc::new(entry)).is_some()
    }

    /// Removes the entry stored under `id`.
    ///
    /// Returns `true` if an entry existed. Later entries keep their relative
    /// order.
    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.entries.shift_remove(id).is_some();
        if removed {
            debug!(middleware = id, "unregistered middleware");
        }
        removed
    }

    /// Returns all registered ids in registration order.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "clearing middleware registry");
        self.entries.clear();
    }

    /// Returns counts of total, global and specific entries.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats::collect(self.entries.values().map(|entry| entry.global))
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<MiddlewareEntry<C, R>>> {
        self.entries.get(id)
    }

    /// Checks if an id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<MiddlewareEntry<C, R>>> {
        self.entries.values()
    }
}

impl<C, R> Default for Registry<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> fmt::Debug for Registry<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("ids", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{BoxFuture, Middleware, Next};
    use crate::ChainResult;

    struct Pass;

    impl Middleware<(), ()> for Pass {
        fn process<'a>(
            &'a self,
            ctx: &'a mut (),
            next: Next<'a, (), ()>,
        ) -> BoxFuture<'a, ChainResult<()>> {
            next_boxed(ctx, next)
        }
    }

    fn next_boxed<'a>(ctx: &'a mut (), next: Next<'a, (), ()>) -> BoxFuture<'a, ChainResult<()>> {
        Box::pin(async move { next.run(ctx).await })
    }

    fn pass() -> MiddlewareDefinition<(), ()> {
        MiddlewareDefinition::handler(Pass)
    }

    #[test]
    fn test_register_uses_defaults() {
        let mut registry = Registry::new();
        assert!(!registry.register("a", pass(), RegisterOptions::default()));

        let entry = registry.get("a").unwrap();
        assert_eq!(entry.id(), "a");
        assert_eq!(entry.priority(), DEFAULT_PRIORITY);
        assert!(!entry.is_global());
        assert!(entry.metadata().is_empty());
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = Registry::new();
        registry.register("a", pass(), RegisterOptions::new().priority(1));
        registry.register("b", pass(), RegisterOptions::new());
        assert!(registry.register("a", pass(), RegisterOptions::new().priority(7).global(true)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.registered_ids(), vec!["a", "b"]);
        let entry = registry.get("a").unwrap();
        assert_eq!(entry.priority(), 7);
        assert!(entry.is_global());
    }

    #[test]
    fn test_unregister() {
        let mut registry = Registry::new();
        registry.register("a", pass(), RegisterOptions::new());
        registry.register("b", pass(), RegisterOptions::new());
        registry.register("c", pass(), RegisterOptions::new());

        assert!(registry.unregister("b"));
        assert!(!registry.unregister("b"));
        assert!(!registry.unregister("missing"));
        assert_eq!(registry.registered_ids(), vec!["a", "c"]);
    }

    #[test]
    fn test_stats_and_clear() {
        let mut registry = Registry::new();
        registry.register("g", pass(), RegisterOptions::new().global(true));
        registry.register("s1", pass(), RegisterOptions::new());
        registry.register("s2", pass(), RegisterOptions::new());

        let stats = registry.stats();
        assert_eq!((stats.total, stats.global, stats.specific), (3, 1, 2));

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.stats(), RegistryStats::default());
        assert!(registry.registered_ids().is_empty());
    }

    #[test]
    fn test_metadata_is_stored() {
        let mut registry = Registry::new();
        registry.register(
            "a",
            pass(),
            RegisterOptions::new().metadata("owner", "payments"),
        );

        let entry = registry.get("a").unwrap();
        assert_eq!(entry.metadata()["owner"], "payments");
        assert!(registry.contains("a"));
        assert!(!registry.contains("b"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: RegisterOptions = serde_json::from_str(r#"{"global": true}"#).unwrap();
        assert!(options.global);
        assert_eq!(options.priority, DEFAULT_PRIORITY);

        let err = serde_json::from_str::<RegisterOptions>(r#"{"priorty": 1}"#);
        assert!(err.is_err());
    }
}
