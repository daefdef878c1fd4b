//! Live feed: push full snapshots to subscribers after every change.
//!
//! A subscription is registered for one `(shift, collection)` pair. It
//! receives the current snapshot immediately and a fresh one after every
//! committed write touching that pair. Deliveries are full replacements,
//! never deltas. The returned [`Subscription`] is the disposer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use shift_core::ShiftKey;

use crate::store::StateStore;

/// The independently subscribed lists of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Faults,
    Planned,
    Notes,
    ShiftDetails,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Faults => "faults",
            Collection::Planned => "planned",
            Collection::Notes => "notes",
            Collection::ShiftDetails => "shift_details",
        }
    }
}

/// Re-reads the subscribed snapshot from the store and hands it to the
/// subscriber's callback.
pub(crate) type Notify = Arc<dyn Fn(&StateStore) + Send + Sync>;

struct Listener {
    shift: ShiftKey,
    collection: Collection,
    notify: Notify,
}

/// Registry of live listeners, shared by every clone of a store.
#[derive(Default)]
pub(crate) struct Feed {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Listener>>,
}

impl Feed {
    pub(crate) fn register(
        self: &Arc<Self>,
        shift: ShiftKey,
        collection: Collection,
        notify: Notify,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, %shift, collection = collection.name(), "feed listener registered");
        self.lock().insert(
            id,
            Listener {
                shift,
                collection,
                notify,
            },
        );
        Subscription {
            feed: Arc::downgrade(self),
            id: Some(id),
        }
    }

    /// Deliver a fresh snapshot to every listener of `(shift, collection)`.
    pub(crate) fn publish(&self, store: &StateStore, shift: &ShiftKey, collection: Collection) {
        // Callbacks run outside the lock so they may subscribe or unsubscribe.
        let targets: Vec<Notify> = self
            .lock()
            .values()
            .filter(|l| l.collection == collection && &l.shift == shift)
            .map(|l| Arc::clone(&l.notify))
            .collect();
        for notify in targets {
            notify(store);
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            debug!(id, "feed listener removed");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Listener>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Disposer for a live subscription.
///
/// Call [`Subscription::unsubscribe`] on teardown; dropping the handle has
/// the same effect. A subscription taken on an offline store is inert.
#[must_use = "dropping a subscription stops delivery immediately"]
pub struct Subscription {
    feed: Weak<Feed>,
    id: Option<u64>,
}

impl Subscription {
    pub(crate) fn inert() -> Self {
        Self {
            feed: Weak::new(),
            id: None,
        }
    }

    /// Stop delivery.
    pub fn unsubscribe(mut self) {
        self.dispose();
    }

    pub fn is_live(&self) -> bool {
        self.id.is_some() && self.feed.strong_count() > 0
    }

    fn dispose(&mut self) {
        if let (Some(id), Some(feed)) = (self.id.take(), self.feed.upgrade()) {
            feed.remove(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}
