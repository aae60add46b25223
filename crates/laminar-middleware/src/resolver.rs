//! Turns stored definitions into callable handlers.

use crate::error::{ChainError, ChainResult};
use crate::middleware::{BoxedMiddleware, MiddlewareDefinition};
use std::sync::Arc;
use tracing::trace;

/// Resolves the definition registered under `id` into one handler.
///
/// Function handlers are shared; capability types are instantiated anew on
/// every call.
///
/// # Errors
///
/// Returns [`ChainError::InvalidMiddlewareKind`] if a capability factory
/// cannot produce an instance.
pub(crate) fn resolve<C, R>(
    id: &str,
    definition: &MiddlewareDefinition<C, R>,
) -> ChainResult<BoxedMiddleware<C, R>>
where
    C: 'static,
    R: 'static,
{
    match definition {
        MiddlewareDefinition::Function(handler) => Ok(Arc::clone(handler)),
        MiddlewareDefinition::Capability(factory) => {
            trace!(middleware = id, "instantiating capability");
            factory
                .instantiate()
                .map(Arc::from)
                .map_err(|reason| ChainError::invalid_kind(id, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{BoxFuture, Middleware, MiddlewareFactory, Next};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted;

    impl Middleware<(), ()> for Counted {
        fn process<'a>(
            &'a self,
            ctx: &'a mut (),
            next: Next<'a, (), ()>,
        ) -> BoxFuture<'a, ChainResult<()>> {
            Box::pin(async move { next.run(ctx).await })
        }
    }

    struct Refusing;

    impl MiddlewareFactory<(), ()> for Refusing {
        fn instantiate(&self) -> Result<Box<dyn Middleware<(), ()>>, String> {
            Err("missing credentials".to_string())
        }
    }

    #[test]
    fn test_function_is_shared() {
        let definition = MiddlewareDefinition::<(), ()>::handler(Counted);
        let a = resolve("a", &definition).unwrap();
        let b = resolve("a", &definition).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_capability_is_fresh_per_resolution() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let definition = MiddlewareDefinition::<(), ()>::capability(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Counted
        });

        let a = resolve("a", &definition).unwrap();
        let b = resolve("a", &definition).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failing_factory_is_invalid_kind() {
        let definition = MiddlewareDefinition::<(), ()>::capability(Refusing);
        let err = resolve("auth", &definition).err().unwrap();

        assert!(matches!(err, ChainError::InvalidMiddlewareKind { ref id, .. } if id == "auth"));
        assert!(err.to_string().contains("missing credentials"));
    }
}
