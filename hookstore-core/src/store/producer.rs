//! Producer
//!
//! A Producer is one mounted instance of a store. It owns the slot its
//! descendants read from and keeps it current.
//!
//! # Update Cycle
//!
//! An update is split into two phases so the host can guarantee that
//! consumers never observe a stale value:
//!
//! 1. `render` runs the computation and commits the result into the slot.
//!    From here on, any consumer reading the slot sees the new value.
//!
//! 2. `publish_and_notify` commits the stable callback bodies staged during
//!    the render, then invokes every listener with the committed value.
//!
//! `update` runs both phases back to back. With `EffectTiming::Passive` the
//! second phase is left pending until `flush_effects`.
//!
//! Notification only ever asks consumers to re-render; it never re-renders
//! the producer itself.

use std::fmt;
use std::sync::Arc;

use super::factory::Store;
use super::hooks::Hooks;
use super::listener::RerenderHandle;
use super::scope::ProviderScope;
use super::slot::Slot;
use crate::config::EffectTiming;

/// A mounted instance of a store.
pub struct Producer<V, P = ()>
where
    V: Send + Sync + 'static,
    P: 'static,
{
    store: Store<V, P>,
    slot: Slot<V>,
    hooks: Hooks,
    props: P,
    effects_pending: bool,
}

impl<V, P> Producer<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
{
    /// Mount a producer: run the first render and create the slot.
    pub(crate) fn mount(store: Store<V, P>, props: P, rerender: RerenderHandle) -> Self {
        let mut hooks = Hooks::new(rerender);
        hooks.begin_render();
        let value = store.compute(&mut hooks, &props);
        hooks.end_render();

        let slot = Slot::new(value);
        tracing::debug!(store = store.name(), slot = slot.id(), "producer mounted");

        let mut producer = Self {
            store,
            slot,
            hooks,
            props,
            effects_pending: true,
        };
        if producer.timing() == EffectTiming::Layout {
            producer.publish_and_notify();
        }
        producer
    }

    fn timing(&self) -> EffectTiming {
        self.store.config().effect_timing
    }

    /// Run the computation and commit its output into the slot.
    ///
    /// Consumers reading the slot after this call observe the new value,
    /// but no listener has been invoked yet.
    pub fn render(&mut self) -> Arc<V> {
        self.hooks.begin_render();
        let value = self.store.compute(&mut self.hooks, &self.props);
        self.hooks.end_render();

        self.slot.commit(Arc::clone(&value));
        self.effects_pending = true;
        tracing::trace!(
            store = self.store.name(),
            slot = self.slot.id(),
            render = self.hooks.renders(),
            "producer committed"
        );
        value
    }

    /// Run the post-commit phase: commit staged callback bodies, then
    /// notify every listener of the committed value.
    ///
    /// Returns the number of listeners invoked.
    pub fn publish_and_notify(&mut self) -> usize {
        self.effects_pending = false;
        let callbacks = self.hooks.commit_events();
        let notified = self.slot.notify();
        tracing::debug!(
            store = self.store.name(),
            slot = self.slot.id(),
            callbacks,
            notified,
            "producer published"
        );
        notified
    }

    /// Run a pending post-commit phase, if any.
    ///
    /// Returns the number of listeners invoked.
    pub fn flush_effects(&mut self) -> usize {
        if !self.effects_pending {
            return 0;
        }
        self.publish_and_notify()
    }

    /// Re-render and, for `EffectTiming::Layout`, publish.
    ///
    /// Returns the number of listeners invoked.
    pub fn update(&mut self) -> usize {
        self.render();
        match self.timing() {
            EffectTiming::Layout => self.publish_and_notify(),
            EffectTiming::Passive => 0,
        }
    }

    /// Replace the props used by the next render.
    pub fn set_props(&mut self, props: P) {
        self.props = props;
        self.hooks.mark_dirty();
    }

    /// Get the props used by the last render.
    pub fn props(&self) -> &P {
        &self.props
    }

    /// Check whether state or props changed since the last render.
    pub fn needs_update(&self) -> bool {
        self.hooks.is_dirty()
    }

    /// Check whether a post-commit phase is waiting to run.
    pub fn has_pending_effects(&self) -> bool {
        self.effects_pending
    }

    /// Get the committed value.
    pub fn value(&self) -> Arc<V> {
        self.slot.value()
    }

    /// Get the slot shared with consumers.
    pub fn slot(&self) -> &Slot<V> {
        &self.slot
    }

    /// Get the store this producer was mounted from.
    pub fn store(&self) -> &Store<V, P> {
        &self.store
    }

    /// Get the producer's hook state.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Number of consumers currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        self.slot.subscriber_count()
    }

    /// Run `mount_children` with this producer's slot installed, so that
    /// consumers of the same store mounted inside bind to it.
    pub fn provide<R>(&self, mount_children: impl FnOnce() -> R) -> R {
        let _scope = ProviderScope::enter(self.store.id(), self.slot.clone());
        mount_children()
    }
}

impl<V, P> Drop for Producer<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
{
    fn drop(&mut self) {
        self.slot.tear_down();
        tracing::debug!(store = self.store.name(), slot = self.slot.id(), "producer unmounted");
    }
}

impl<V, P> fmt::Debug for Producer<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("store", &self.store)
            .field("slot", &self.slot.id())
            .field("hooks", &self.hooks)
            .field("effects_pending", &self.effects_pending)
            .finish()
    }
}
