//! Context Slot
//!
//! A Slot is the binding a producer shares with its descendant consumers.
//! It holds the latest committed value and the ordered set of listeners.
//!
//! # Ownership
//!
//! - The owning producer is the only writer of `value` (through `commit`).
//! - Each consumer adds and removes only its own listener.
//! - Cloning a `Slot` clones the handle; all clones share the same state.
//!
//! # Notification
//!
//! `notify` snapshots the listener set, releases the lock, and then invokes
//! each listener in insertion order with the committed value. A listener
//! removed while a pass is running is skipped if it has not been reached yet;
//! listeners added during a pass first run on the next pass.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use super::listener::{Listener, ListenerId};

/// Counter for generating unique slot IDs.
static SLOT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique slot ID.
fn next_slot_id() -> u64 {
    SLOT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct SlotInner<V> {
    id: u64,
    value: RwLock<Arc<V>>,
    subscribers: Mutex<IndexMap<ListenerId, Listener<V>>>,
    torn_down: AtomicBool,
}

/// Shared binding between one producer and its consumers.
pub struct Slot<V> {
    inner: Arc<SlotInner<V>>,
}

impl<V> Slot<V>
where
    V: Send + Sync + 'static,
{
    /// Create a slot holding the given initial value.
    pub fn new(value: Arc<V>) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                id: next_slot_id(),
                value: RwLock::new(value),
                subscribers: Mutex::new(IndexMap::new()),
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    /// Get the slot's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the currently committed value.
    pub fn value(&self) -> Arc<V> {
        Arc::clone(&self.inner.value.read())
    }

    /// Replace the committed value. Does not notify.
    pub fn commit(&self, value: Arc<V>) {
        *self.inner.value.write() = value;
    }

    /// Add a listener. It will be invoked on every subsequent `notify`.
    pub fn subscribe(&self, listener: Listener<V>) -> ListenerId {
        let id = ListenerId::new();
        self.inner.subscribers.lock().insert(id, listener);
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.subscribers.lock().shift_remove(&id).is_some()
    }

    /// Check whether a listener is currently registered.
    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.inner.subscribers.lock().contains_key(&id)
    }

    /// Get the number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Invoke every listener with the committed value.
    ///
    /// Returns the number of listeners invoked.
    pub fn notify(&self) -> usize {
        let value = self.value();
        let snapshot: SmallVec<[(ListenerId, Listener<V>); 8]> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        let mut invoked = 0;
        for (id, listener) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            listener(&value);
            invoked += 1;
        }
        invoked
    }

    /// Mark the slot as torn down and drop all listeners.
    pub fn tear_down(&self) {
        self.inner.torn_down.store(true, Ordering::SeqCst);
        self.inner.subscribers.lock().clear();
    }

    /// Check whether the owning producer has been unmounted.
    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    /// Check whether two handles refer to the same slot.
    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V> Clone for Slot<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Debug for Slot<V>
where
    V: Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.inner.id)
            .field("value", &self.value())
            .field("subscriber_count", &self.subscriber_count())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn commit_replaces_value_without_notifying() {
        let slot = Slot::new(Arc::new(1));
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        slot.subscribe(Arc::new(move |_: &Arc<i32>| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        slot.commit(Arc::new(2));
        assert_eq!(*slot.value(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn notify_passes_committed_value_in_order() {
        let slot = Slot::new(Arc::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            slot.subscribe(Arc::new(move |value: &Arc<i32>| {
                seen.lock().push((tag, **value));
            }));
        }

        slot.commit(Arc::new(7));
        assert_eq!(slot.notify(), 3);
        assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7), ("c", 7)]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let slot = Slot::new(Arc::new(0));
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let id = slot.subscribe(Arc::new(move |_: &Arc<i32>| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        slot.notify();
        assert!(slot.unsubscribe(id));
        assert!(!slot.unsubscribe(id));
        slot.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(slot.subscriber_count(), 0);
    }

    #[test]
    fn listener_removed_mid_pass_is_skipped() {
        let slot = Slot::new(Arc::new(0));
        let later_calls = Arc::new(AtomicI32::new(0));

        let victim: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let slot_clone = slot.clone();
        let victim_clone = victim.clone();
        slot.subscribe(Arc::new(move |_: &Arc<i32>| {
            if let Some(id) = victim_clone.lock().take() {
                slot_clone.unsubscribe(id);
            }
        }));

        let later_clone = later_calls.clone();
        let id = slot.subscribe(Arc::new(move |_: &Arc<i32>| {
            later_clone.fetch_add(1, Ordering::SeqCst);
        }));
        *victim.lock() = Some(id);

        assert_eq!(slot.notify(), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_may_subscribe_during_pass() {
        let slot = Slot::new(Arc::new(0));
        let added = Arc::new(AtomicI32::new(0));

        let slot_clone = slot.clone();
        let added_clone = added.clone();
        slot.subscribe(Arc::new(move |_: &Arc<i32>| {
            let added = added_clone.clone();
            slot_clone.subscribe(Arc::new(move |_: &Arc<i32>| {
                added.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        // The listener added during the first pass is not called in it.
        assert_eq!(slot.notify(), 1);
        assert_eq!(added.load(Ordering::SeqCst), 0);
        assert_eq!(slot.subscriber_count(), 2);
    }

    #[test]
    fn tear_down_clears_listeners() {
        let slot = Slot::new(Arc::new(0));
        slot.subscribe(Arc::new(|_: &Arc<i32>| {}));
        let handle = slot.clone();

        slot.tear_down();
        assert!(handle.is_torn_down());
        assert_eq!(handle.subscriber_count(), 0);
        assert!(handle.same_slot(&slot));
    }
}
