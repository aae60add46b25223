//! Per-execution chain construction.
//!
//! A [`Chain`] is the ordered list of entries one execution runs through.
//! It holds its own references to the entries, so registry changes made
//! while a chain is running do not affect it.

use crate::registry::{MiddlewareEntry, Registry};
use laminar_telemetry::metrics as telemetry_metrics;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// An ordered snapshot of the entries selected for one execution.
pub struct Chain<C, R> {
    entries: Vec<Arc<MiddlewareEntry<C, R>>>,
}

impl<C, R> Chain<C, R> {
    /// Builds the chain for `target_ids`.
    ///
    /// Every global entry is included, plus each requested id that is
    /// registered. Unknown ids are logged and skipped; an id requested twice
    /// is included once. The result is sorted by ascending priority, keeping
    /// registration order between equal priorities.
    ///
    /// Selection walks the registry, not `target_ids`, so entries enter the
    /// stable sort in registration order. Collecting globals first and then
    /// targets in request order would instead let a global precede a target
    /// of equal priority, and would make tie order depend on how the caller
    /// listed its targets.
    ///
    /// # Example
    ///
    /// ```
    /// use laminar_middleware::{Chain, MiddlewareDefinition, RegisterOptions, Registry};
    ///
    /// fn pass() -> MiddlewareDefinition<(), ()> {
    ///     MiddlewareDefinition::<(), ()>::function(|ctx, next| {
    ///         Box::pin(async move { next.run(ctx).await })
    ///     })
    /// }
    ///
    /// let mut registry = Registry::new();
    /// registry.register("late", pass(), RegisterOptions::new().priority(20));
    /// registry.register("early", pass(), RegisterOptions::new().priority(10));
    /// registry.register("audit", pass(), RegisterOptions::new().global(true));
    ///
    /// let chain = Chain::build(&registry, &["late", "early", "unknown"]);
    /// assert_eq!(chain.ids(), vec!["early", "late", "audit"]);
    /// ```
    pub fn build<S: AsRef<str>>(registry: &Registry<C, R>, target_ids: &[S]) -> Self {
        let mut requested = HashSet::with_capacity(target_ids.len());
        for id in target_ids {
            let id = id.as_ref();
            if registry.contains(id) {
                requested.insert(id);
            } else {
                warn!(middleware = id, "unknown middleware requested, skipping");
                telemetry_metrics::record_unknown_target();
            }
        }

        let mut entries: Vec<_> = registry
            .entries()
            .filter(|entry| entry.is_global() || requested.contains(entry.id()))
            .cloned()
            .collect();

        entries.sort_by_key(|entry| entry.priority());

        debug!(
            chain_len = entries.len(),
            targets = target_ids.len(),
            "built middleware chain"
        );

        Self { entries }
    }

    /// Creates a chain with no middleware.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chain has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<MiddlewareEntry<C, R>>> {
        self.entries.get(index)
    }

    /// Returns entry ids in execution order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id()).collect()
    }
}

impl<C, R> fmt::Debug for Chain<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("ids", &self.ids()).finish()
    }
}
