//! Listener registry.
//!
//! Listeners are kept in an [`IndexMap`] keyed by a registration id, so
//! dispatch follows registration order and removal is by identity.
//!
//! A listener that returns an error or panics does not stop delivery to the
//! listeners after it. The fault is logged and dispatch moves on.

use std::panic::{AssertUnwindSafe, catch_unwind};

use indexmap::IndexMap;
use tracing::warn;

use crate::event::ChangeEvent;

/// Error type listeners may return.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) type Listener<T> = Box<dyn FnMut(&ChangeEvent<T>) -> Result<(), ListenerError>>;

/// Boxes a fallible listener closure.
#[inline]
pub(crate) fn boxed<T, F>(listener: F) -> Listener<T>
where
    F: FnMut(&ChangeEvent<T>) -> Result<(), ListenerError> + 'static,
{
    Box::new(listener)
}

/// Token returned by `subscribe`; pass it to `unsubscribe` to remove exactly
/// that listener.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping the subscription makes the listener impossible to remove"]
pub struct Subscription(u64);

impl Subscription {
    /// Returns the registration id.
    pub const fn id(&self) -> u64 {
        self.0
    }
}

pub(crate) struct Observers<T> {
    listeners: IndexMap<u64, Listener<T>>,
    next_id: u64,
}

impl<T> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: IndexMap::new(),
            next_id: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn subscribe(&mut self, listener: Listener<T>) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, listener);
        Subscription(id)
    }

    pub(crate) fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        // shift_remove keeps the remaining listeners in registration order
        self.listeners.shift_remove(&subscription.0).is_some()
    }

    /// Delivers `event` to every listener, containing per-listener faults.
    ///
    /// Returns the number of listeners that failed.
    pub(crate) fn notify(&mut self, event: &ChangeEvent<T>) -> usize {
        let mut failures = 0;
        for (id, listener) in self.listeners.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    failures += 1;
                    warn!(listener = id, event = event.kind(), %error, "listener failed");
                }
                Err(payload) => {
                    failures += 1;
                    let message = payload
                        .downcast_ref::<&str>()
                        .copied()
                        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                        .unwrap_or("<non-string panic>");
                    warn!(listener = id, event = event.kind(), panic = message, "listener panicked");
                }
            }
        }
        failures
    }
}
