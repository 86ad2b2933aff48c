//! Typed change notification.
//!
//! An [`EventChannel`] is a callback registry for one event type. The form
//! store owns one channel per event kind; conditional evaluators, the
//! rendering layer and the host subscribe to the ones they care about.
//!
//! Handlers run synchronously on the emitting thread, in subscription order.
//! The registry lock is released before handlers run, so a handler may read
//! the store, subscribe or unsubscribe without deadlocking.
//!
//! An event emitted while the channel is dispatching, typically from inside
//! one of its handlers, is queued and delivered by the dispatching thread once
//! the current event has reached every handler. Subscribers therefore observe
//! events in emission order and the last one they see is the latest.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use crate::validation::ValidationResult;

/// Identifier of a registered handler within one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__subscription_{}", self.0)
    }
}

/// Published after a field's stored validation result changed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidated {
    pub field_id: String,
    /// `None` when the result was cleared.
    pub result: Option<ValidationResult>,
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<T>)>,
}

struct Dispatch<T> {
    active: bool,
    queued: VecDeque<T>,
}

/// Releases the dispatch when a handler panics.
struct DispatchGuard<'a, T> {
    dispatch: &'a Mutex<Dispatch<T>>,
}

impl<T> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut dispatch = lock_dispatch(self.dispatch);
            dispatch.active = false;
            dispatch.queued.clear();
        }
    }
}

fn lock_dispatch<T>(dispatch: &Mutex<Dispatch<T>>) -> MutexGuard<'_, Dispatch<T>> {
    dispatch
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Callback registry for events of type `T`.
///
/// Cloning yields another handle to the same registry.
pub struct EventChannel<T> {
    inner: Arc<RwLock<Registry<T>>>,
    dispatch: Arc<Mutex<Dispatch<T>>>,
}

impl<T: 'static> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
            dispatch: Arc::new(Mutex::new(Dispatch {
                active: false,
                queued: VecDeque::new(),
            })),
        }
    }

    /// Register a handler. It stays registered until the returned
    /// [`Subscription`] is dropped (or forever, after [`Subscription::forget`]).
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self
                .inner
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let id = SubscriptionId(registry.next_id);
            registry.next_id += 1;
            registry.handlers.push((id, Arc::new(handler)));
            id
        };

        let registry: Weak<RwLock<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            detach: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    remove(&registry, id);
                }
            })),
        }
    }

    /// Remove a handler by id. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        remove(&self.inner, id)
    }

    fn deliver(&self, event: &T) {
        let handlers: Vec<Handler<T>> = self
            .inner
            .read()
            .map(|registry| registry.handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in handlers {
            handler(event);
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.inner.read().map(|r| r.handlers.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every handler.
    pub fn clear(&self) {
        if let Ok(mut registry) = self.inner.write() {
            registry.handlers.clear();
        }
    }
}

impl<T: Clone + 'static> EventChannel<T> {
    /// Deliver an event to every handler registered at the time of delivery.
    ///
    /// Called from inside a handler, the event is queued behind the one
    /// being dispatched.
    pub fn emit(&self, event: &T) {
        {
            let mut dispatch = lock_dispatch(&self.dispatch);
            if dispatch.active {
                dispatch.queued.push_back(event.clone());
                return;
            }
            dispatch.active = true;
        }
        let _guard = DispatchGuard {
            dispatch: &self.dispatch,
        };

        self.deliver(event);
        loop {
            let next = {
                let mut dispatch = lock_dispatch(&self.dispatch);
                let next = dispatch.queued.pop_front();
                if next.is_none() {
                    dispatch.active = false;
                }
                next
            };
            match next {
                Some(event) => self.deliver(&event),
                None => break,
            }
        }
    }
}

fn remove<T>(registry: &RwLock<Registry<T>>, id: SubscriptionId) -> bool {
    match registry.write() {
        Ok(mut registry) => {
            let before = registry.handlers.len();
            registry.handlers.retain(|(hid, _)| *hid != id);
            registry.handlers.len() != before
        }
        Err(_) => false,
    }
}

impl<T: 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.inner.read().map(|r| r.handlers.len()).unwrap_or(0);
        f.debug_struct("EventChannel")
            .field("handlers", &handlers)
            .finish()
    }
}

/// Guard for a registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: SubscriptionId,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Keep the handler registered for the lifetime of the channel.
    pub fn forget(mut self) -> SubscriptionId {
        self.detach = None;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_in_subscription_order() {
        let channel = EventChannel::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = {
            let seen = Arc::clone(&seen);
            channel.subscribe(move |v| seen.lock().unwrap().push(("a", *v)))
        };
        let b = {
            let seen = Arc::clone(&seen);
            channel.subscribe(move |v| seen.lock().unwrap().push(("b", *v)))
        };

        channel.emit(&7);
        assert_eq!(*seen.lock().unwrap(), [("a", 7), ("b", 7)]);
        drop((a, b));
    }

    #[test]
    fn test_nested_emit_is_delivered_after_current_dispatch() {
        let channel = EventChannel::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let echo = {
            let handle = channel.clone();
            let seen = Arc::clone(&seen);
            channel.subscribe(move |v| {
                seen.lock().unwrap().push(("echo", *v));
                if *v == 1 {
                    handle.emit(&2);
                }
            })
        };
        let last = {
            let seen = Arc::clone(&seen);
            channel.subscribe(move |v| seen.lock().unwrap().push(("last", *v)))
        };

        channel.emit(&1);
        assert_eq!(
            *seen.lock().unwrap(),
            [("echo", 1), ("last", 1), ("echo", 2), ("last", 2)]
        );

        // dispatch state is released afterwards
        channel.emit(&3);
        assert_eq!(seen.lock().unwrap().len(), 6);
        drop((echo, last));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let channel = EventChannel::<()>::new();
        let sub = channel.subscribe(|_| {});
        assert_eq!(channel.len(), 1);
        drop(sub);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_forget_keeps_handler() {
        let channel = EventChannel::<()>::new();
        let id = channel.subscribe(|_| {}).forget();
        assert_eq!(channel.len(), 1);
        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let channel = EventChannel::<()>::new();
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let handle = channel.clone();
        let own_id = Arc::clone(&slot);
        let id = channel
            .subscribe(move |_| {
                if let Some(id) = *own_id.lock().unwrap() {
                    handle.unsubscribe(id);
                }
            })
            .forget();
        *slot.lock().unwrap() = Some(id);

        channel.emit(&());
        assert!(channel.is_empty());
    }
}
