use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::watcher::{ChangeEvent, ChangeKind};

/// Callback invoked synchronously for every matching event
pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registered {
    id: ListenerId,
    kind: ChangeKind,
    listener: Listener,
}

/// Listeners keyed by event kind, shared by the watcher's event loop and
/// every subscription handle.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Registered>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registered>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on(&self, kind: ChangeKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Registered { id, kind, listener });
        id
    }

    /// Remove one listener. Returns false when it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every listener registered for the event's kind, in registration order.
    ///
    /// Listeners run outside the lock so they may unsubscribe themselves.
    pub fn dispatch(&self, event: &ChangeEvent) {
        let matching: Vec<Listener> = self
            .lock()
            .iter()
            .filter(|r| r.kind == event.kind)
            .map(|r| r.listener.clone())
            .collect();

        for listener in matching {
            listener(event);
        }
    }
}

/// Handle for one subscriber's listeners (one per event kind).
///
/// `unsubscribe` removes exactly those listeners; dropping the handle does too.
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    ids: Vec<ListenerId>,
}

impl Subscription {
    pub(crate) fn register(registry: &Arc<ListenerRegistry>, listener: Listener) -> Self {
        let ids = ChangeKind::ALL
            .iter()
            .map(|kind| registry.on(*kind, listener.clone()))
            .collect();

        Self {
            registry: Arc::downgrade(registry),
            ids,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.ids.is_empty()
    }

    /// Deregister this subscription's listeners. Idempotent.
    pub fn unsubscribe(&mut self) {
        let ids = std::mem::take(&mut self.ids);
        if let Some(registry) = self.registry.upgrade() {
            for id in ids {
                registry.off(id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
