//! In-process publish/subscribe hub.

use super::{Event, EventKind};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// A subscriber callback.
///
/// An `Err` return is the subscriber's failure signal; `emit` logs it and
/// keeps invoking the remaining subscribers.
type Callback = Arc<dyn Fn(&Event) -> Result<()> + Send + Sync>;

struct Listener {
    id: u64,
    callback: Callback,
    once: bool,
}

#[derive(Default)]
struct Inner {
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
    next_id: AtomicU64,
}

impl Inner {
    // Poisoning only means a subscriber panicked mid-emit; the listener
    // table itself stays consistent, so keep serving it.
    fn lock(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Listener>>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove(&self, kind: EventKind, id: u64) {
        let mut listeners = self.lock();
        if let Some(entries) = listeners.get_mut(&kind) {
            entries.retain(|l| l.id != id);
            if entries.is_empty() {
                listeners.remove(&kind);
            }
        }
    }
}

/// Central event bus.
///
/// Cheap to clone; all clones share the same listener table.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an event kind.
    ///
    /// Subscribers for the same kind are invoked in registration order.
    /// The returned [`Subscription`] removes exactly this registration;
    /// dropping it without cancelling leaves the registration alive.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(callback), false)
    }

    /// Subscribe to an event kind for a single invocation.
    ///
    /// The registration is removed after the first invocation, also when
    /// the callback returns an error.
    pub fn once<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(callback), true)
    }

    fn register(&self, kind: EventKind, callback: Callback, once: bool) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().entry(kind).or_default().push(Listener {
            id,
            callback,
            once,
        });
        Subscription {
            inner: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Emit an event to every subscriber currently registered for its kind.
    ///
    /// Invocation is synchronous and in registration order. A failing
    /// subscriber is logged and never prevents the remaining subscribers
    /// from running, nor surfaces to the emitter. The subscriber set is
    /// snapshotted at emit time, so callbacks may subscribe or unsubscribe
    /// without affecting the current dispatch.
    pub fn emit(&self, event: Event) {
        let kind = event.kind();
        let snapshot: Vec<(u64, Callback, bool)> = {
            let listeners = self.inner.lock();
            match listeners.get(&kind) {
                Some(entries) => entries
                    .iter()
                    .map(|l| (l.id, Arc::clone(&l.callback), l.once))
                    .collect(),
                None => return,
            }
        };

        tracing::debug!(event = %kind, listeners = snapshot.len(), "emitting");

        for (id, callback, once) in snapshot {
            if let Err(error) = callback(&event) {
                tracing::error!(event = %kind, %error, "error in event listener");
            }
            if once {
                self.inner.remove(kind, id);
            }
        }
    }

    /// Remove all subscribers for an event kind.
    pub fn off(&self, kind: EventKind) {
        self.inner.lock().remove(&kind);
    }

    /// Remove all subscribers.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Event kinds that currently have subscribers.
    pub fn active_kinds(&self) -> Vec<EventKind> {
        self.inner.lock().keys().copied().collect()
    }

    /// Number of subscribers for an event kind.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.lock().get(&kind).map_or(0, Vec::len)
    }
}

/// Handle for removing a single registration.
pub struct Subscription {
    inner: Weak<Inner>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    /// Remove this registration. Idempotent.
    pub fn cancel(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.remove(self.kind, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AccountState;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;

    fn account_event() -> Event {
        Event::AccountUpdated(AccountState::default())
    }

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_handle = Arc::clone(&log);
        let make = move |name: &'static str| -> Callback {
            let log = Arc::clone(&log_handle);
            Arc::new(move |_event: &Event| {
                log.lock().unwrap().push(name);
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_subscribers_invoked_in_registration_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();

        bus.register(EventKind::AccountUpdated, make("first"), false);
        bus.register(EventKind::AccountUpdated, make("second"), false);
        bus.register(EventKind::AccountUpdated, make("third"), false);

        bus.emit(account_event());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_subscriber_does_not_stop_later_ones() {
        let bus = EventBus::new();
        let (log, make) = recorder();

        bus.register(EventKind::AccountUpdated, make("before"), false);
        bus.on(EventKind::AccountUpdated, |_| {
            Err(crate::Error::data("listener failure"))
        });
        bus.register(EventKind::AccountUpdated, make("after"), false);

        bus.emit(account_event());
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn test_once_invoked_at_most_once() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        bus.once(EventKind::TradesUpdated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit(Event::TradesUpdated(Default::default()));
        bus.emit(Event::TradesUpdated(Default::default()));
        bus.emit(Event::TradesUpdated(Default::default()));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(EventKind::TradesUpdated), 0);
    }

    #[test]
    fn test_once_unsubscribes_even_when_callback_fails() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        bus.once(EventKind::AccountUpdated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(crate::Error::data("boom"))
        });

        bus.emit(account_event());
        bus.emit(account_event());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_removes_exactly_one_registration_and_is_idempotent() {
        let bus = EventBus::new();
        let (log, make) = recorder();

        bus.register(EventKind::AccountUpdated, make("keep"), false);
        let sub = bus.register(EventKind::AccountUpdated, make("drop"), false);

        sub.cancel();
        sub.cancel();

        bus.emit(account_event());
        assert_eq!(*log.lock().unwrap(), vec!["keep"]);
    }

    #[test]
    fn test_off_removes_all_subscribers_for_kind() {
        let bus = EventBus::new();
        let (log, make) = recorder();

        bus.register(EventKind::AccountUpdated, make("a"), false);
        bus.register(EventKind::AccountUpdated, make("b"), false);
        bus.register(EventKind::TradesUpdated, make("other"), false);

        bus.off(EventKind::AccountUpdated);
        bus.emit(account_event());
        bus.emit(Event::TradesUpdated(Default::default()));

        assert_eq!(*log.lock().unwrap(), vec!["other"]);
        assert_eq!(bus.active_kinds(), vec![EventKind::TradesUpdated]);
    }

    #[test]
    fn test_subscriber_may_unsubscribe_during_emit() {
        let bus = EventBus::new();
        let (log, make) = recorder();

        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_handle = Arc::clone(&slot);
        bus.on(EventKind::AccountUpdated, move |_| {
            if let Some(sub) = slot_handle.lock().unwrap().take() {
                sub.cancel();
            }
            Ok(())
        });
        let target = bus.register(EventKind::AccountUpdated, make("target"), false);
        *slot.lock().unwrap() = Some(target);

        // Snapshot semantics: the current dispatch still reaches "target",
        // the next one doesn't.
        bus.emit(account_event());
        bus.emit(account_event());
        assert_eq!(*log.lock().unwrap(), vec!["target"]);
    }
}
