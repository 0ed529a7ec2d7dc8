use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

struct Registry<T: ?Sized> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// Ordered set of callbacks that all receive every emitted value.
///
/// A panicking handler is caught and logged; the remaining handlers still run.
pub struct HandlerRegistry<T: ?Sized> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: ?Sized + 'static> HandlerRegistry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler; the returned subscription removes exactly this one
    pub fn register<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.push((id, Arc::new(handler)));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .handlers
                    .retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Call every handler in registration order, returning how many completed
    pub fn emit(&self, value: &T) -> usize {
        let handlers: Vec<Handler<T>> = {
            let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        }; // Lock released before calling out

        let mut completed = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(value))) {
                Ok(()) => completed += 1,
                Err(_) => tracing::error!("Handler panicked, continuing with remaining handlers"),
            }
        }
        completed
    }
}

impl<T: ?Sized + 'static> Default for HandlerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for HandlerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Handle returned by every `on_*`/`subscribe` registration.
///
/// Dropping it leaves the handler registered; call [`unsubscribe`](Self::unsubscribe)
/// to remove it.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(remove: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_all_handlers_receive_in_order() {
        let registry: HandlerRegistry<str> = HandlerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for name in ["a", "b"] {
            let seen = Arc::clone(&seen);
            let _sub = registry.register(move |v: &str| {
                seen.lock().unwrap().push(format!("{name}:{v}"));
            });
        }

        registry.emit("x");
        registry.emit("y");
        assert_eq!(*seen.lock().unwrap(), vec!["a:x", "b:x", "a:y", "b:y"]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_handler() {
        let registry: HandlerRegistry<u32> = HandlerRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        let sub = registry.register(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = Arc::clone(&second);
        let _keep = registry.register(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        registry.emit(&1);
        sub.unsubscribe();
        registry.emit(&2);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
        assert_eq!(registry.emit(&3), 1);
    }

    #[test]
    fn test_panicking_handler_does_not_block_others() {
        let registry: HandlerRegistry<u32> = HandlerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _bad = registry.register(|_| panic!("subscriber bug"));
        let c = Arc::clone(&count);
        let _good = registry.register(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.emit(&7), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped_is_noop() {
        let registry: HandlerRegistry<u32> = HandlerRegistry::new();
        let sub = registry.register(|_| {});
        drop(registry);
        sub.unsubscribe();
    }
}
