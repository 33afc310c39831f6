//! Consumer
//!
//! A Consumer reads the value of the nearest enclosing producer, optionally
//! through a selector, and asks its host to re-render only when the selected
//! slice has changed by identity.
//!
//! # Subscription Record
//!
//! Each consumer keeps a record of what it last rendered: the full value,
//! the selected slice, and the selector used. The record is shared with the
//! consumer's listener by reference, so a listener registered once always
//! compares against the latest render and applies the latest selector.
//!
//! # Listener Decision
//!
//! Given the newly committed value, the listener:
//!
//! 1. skips if it is the same `Arc` the consumer last rendered;
//! 2. otherwise applies the current selector;
//! 3. skips if the selection is identical to the last rendered selection;
//! 4. otherwise requests a re-render of this consumer only.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::listener::{ListenerId, RerenderHandle};
use super::slot::Slot;
use crate::error::{Result, StoreError};
use crate::identity::Identity;

/// Projection from the full value to the slice a consumer renders.
pub type Selector<V, S> = Arc<dyn Fn(&Arc<V>) -> S + Send + Sync>;

struct Record<V, S> {
    value: Arc<V>,
    selected: S,
    selector: Selector<V, S>,
}

/// A mounted reader of a producer's slot.
pub struct Consumer<V, S>
where
    V: Send + Sync + 'static,
{
    store: Arc<str>,
    slot: Slot<V>,
    record: Arc<Mutex<Record<V, S>>>,
    listener: ListenerId,
    renders: usize,
}

impl<V, S> Consumer<V, S>
where
    V: Send + Sync + 'static,
    S: Identity + Clone + Send + Sync + 'static,
{
    /// Mount a consumer on `slot`: run the first selection and subscribe.
    pub(crate) fn mount(
        store: Arc<str>,
        slot: Slot<V>,
        selector: Selector<V, S>,
        rerender: RerenderHandle,
    ) -> Result<Self> {
        if slot.is_torn_down() {
            return Err(StoreError::ProducerUnmounted {
                store: store.to_string(),
            });
        }

        let value = slot.value();
        let selected = selector(&value);
        let record = Arc::new(Mutex::new(Record {
            value,
            selected,
            selector,
        }));

        let listener = slot.subscribe(Self::listener(
            Arc::clone(&store),
            Arc::clone(&record),
            rerender,
        ));
        tracing::debug!(store = %store, slot = slot.id(), ?listener, "consumer mounted");

        Ok(Self {
            store,
            slot,
            record,
            listener,
            renders: 1,
        })
    }

    fn listener(
        store: Arc<str>,
        record: Arc<Mutex<Record<V, S>>>,
        rerender: RerenderHandle,
    ) -> Arc<dyn Fn(&Arc<V>) + Send + Sync> {
        Arc::new(move |next: &Arc<V>| {
            // Copy out of the record so the selector runs unlocked.
            let (seen, selected, selector) = {
                let record = record.lock();
                (
                    Arc::clone(&record.value),
                    record.selected.clone(),
                    Arc::clone(&record.selector),
                )
            };

            if Arc::ptr_eq(&seen, next) {
                tracing::trace!(store = %store, "consumer skipped: value unchanged");
                return;
            }

            let next_selected = selector(next);
            if next_selected.is_same(&selected) {
                tracing::trace!(store = %store, "consumer skipped: selection unchanged");
                return;
            }

            tracing::trace!(store = %store, "consumer re-render requested");
            rerender.request();
        })
    }

    /// Re-render: read the slot, apply the current selector, and record the
    /// result for the listener.
    pub fn render(&mut self) -> Result<S> {
        if self.slot.is_torn_down() {
            return Err(StoreError::ProducerUnmounted {
                store: self.store.to_string(),
            });
        }

        let value = self.slot.value();
        let selector = Arc::clone(&self.record.lock().selector);
        let selected = selector(&value);

        {
            let mut record = self.record.lock();
            record.value = value;
            record.selected = selected.clone();
        }
        self.renders += 1;
        Ok(selected)
    }

    /// Re-render with a new selector. The listener uses it from now on.
    pub fn render_with<F>(&mut self, selector: F) -> Result<S>
    where
        F: Fn(&Arc<V>) -> S + Send + Sync + 'static,
    {
        self.record.lock().selector = Arc::new(selector);
        self.render()
    }

    /// Get the selection from the last render.
    pub fn selected(&self) -> S {
        self.record.lock().selected.clone()
    }

    /// Get the full value seen by the last render.
    pub fn value(&self) -> Arc<V> {
        Arc::clone(&self.record.lock().value)
    }

    /// Number of renders, including the mount.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Get the slot this consumer is bound to.
    pub fn slot(&self) -> &Slot<V> {
        &self.slot
    }

    /// Check whether this consumer's listener is registered.
    pub fn is_subscribed(&self) -> bool {
        self.slot.is_subscribed(self.listener)
    }
}

impl<V, S> Drop for Consumer<V, S>
where
    V: Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.slot.unsubscribe(self.listener);
        tracing::debug!(store = %self.store, listener = ?self.listener, "consumer unmounted");
    }
}

impl<V, S> fmt::Debug for Consumer<V, S>
where
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("store", &self.store)
            .field("slot", &self.slot.id())
            .field("listener", &self.listener)
            .field("renders", &self.renders)
            .finish()
    }
}
