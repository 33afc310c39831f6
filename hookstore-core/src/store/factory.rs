//! Store Factory
//!
//! `create_store` turns a value-producing computation into a reusable
//! `Store`. The store itself holds no value: every `mount` creates an
//! independent producer with its own slot, and consumers bind to whichever
//! producer of the store encloses them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::consumer::Consumer;
use super::hooks::Hooks;
use super::listener::RerenderHandle;
use super::producer::Producer;
use super::scope::ProviderScope;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::identity::Identity;

/// Unique identifier for a store.
///
/// Provider scopes are keyed by this ID, so two stores built from identical
/// computations never see each other's producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    /// Generate a new unique store ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

type Computation<V, P> = dyn Fn(&mut Hooks, &P) -> Arc<V> + Send + Sync;

struct StoreInner<V, P> {
    id: StoreId,
    name: Arc<str>,
    config: StoreConfig,
    compute: Box<Computation<V, P>>,
}

/// A reusable producer/consumer pair built around one computation.
///
/// # Type Parameters
///
/// - `V`: the computed value shared with consumers.
/// - `P`: props passed to the computation on every render.
pub struct Store<V, P = ()> {
    inner: Arc<StoreInner<V, P>>,
}

/// Create a store with the default configuration.
///
/// Every render wraps the computation's output in a fresh `Arc`. A consumer
/// reading the full value therefore re-renders after every producer update,
/// even when the output is an equal primitive such as `5_i32`. Consumers that
/// select a plain scalar compare it by value and are not affected. To let
/// full-value consumers skip, return the previous `Arc` through
/// [`create_shared_store`].
///
/// # Example
///
/// ```rust
/// use hookstore_core::{create_store, Hooks, RerenderHandle};
///
/// let store = create_store(|hooks: &mut Hooks, start: &i32| {
///     let (count, _set) = hooks.use_state(|| *start);
///     count
/// });
///
/// let producer = store.mount(3, RerenderHandle::noop());
/// let consumer = producer
///     .provide(|| store.use_store(RerenderHandle::noop()))
///     .unwrap();
/// assert_eq!(*consumer.selected(), 3);
/// ```
pub fn create_store<V, P, F>(compute: F) -> Store<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
    F: Fn(&mut Hooks, &P) -> V + Send + Sync + 'static,
{
    create_store_with(StoreConfig::default(), compute)
}

/// Create a store with an explicit configuration.
pub fn create_store_with<V, P, F>(config: StoreConfig, compute: F) -> Store<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
    F: Fn(&mut Hooks, &P) -> V + Send + Sync + 'static,
{
    create_shared_store_with(config, move |hooks: &mut Hooks, props: &P| {
        Arc::new(compute(hooks, props))
    })
}

/// Create a store whose computation returns a shared value.
///
/// Returning the same `Arc` as the previous render (for example from
/// [`Hooks::use_memo`]) tells every consumer the value is unchanged, so none
/// of them re-runs its selector.
pub fn create_shared_store<V, P, F>(compute: F) -> Store<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
    F: Fn(&mut Hooks, &P) -> Arc<V> + Send + Sync + 'static,
{
    create_shared_store_with(StoreConfig::default(), compute)
}

/// Create a shared-value store with an explicit configuration.
pub fn create_shared_store_with<V, P, F>(config: StoreConfig, compute: F) -> Store<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
    F: Fn(&mut Hooks, &P) -> Arc<V> + Send + Sync + 'static,
{
    let id = StoreId::new();
    tracing::debug!(store = %config.name, store_id = ?id, "store created");
    Store {
        inner: Arc::new(StoreInner {
            id,
            name: Arc::from(config.name.as_str()),
            config,
            compute: Box::new(compute),
        }),
    }
}

impl<V, P> Store<V, P>
where
    V: Send + Sync + 'static,
    P: 'static,
{
    /// Get the store's unique ID.
    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    /// Get the store's display name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.inner.name)
    }

    /// Get the store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Run the computation once.
    pub(crate) fn compute(&self, hooks: &mut Hooks, props: &P) -> Arc<V> {
        (self.inner.compute)(hooks, props)
    }

    /// Mount a producer of this store.
    ///
    /// The computation runs immediately. `rerender` is the producer's own
    /// re-render capability, requested by its state setters.
    pub fn mount(&self, props: P, rerender: RerenderHandle) -> Producer<V, P> {
        Producer::mount(self.clone(), props, rerender)
    }

    /// Consume the full value from the nearest enclosing producer.
    pub fn use_store(&self, rerender: RerenderHandle) -> Result<Consumer<V, Arc<V>>> {
        self.use_store_with(|value: &Arc<V>| Arc::clone(value), rerender)
    }

    /// Consume a projection of the value from the nearest enclosing producer.
    ///
    /// The consumer requests a re-render only when the projection of a new
    /// value is not identical to the projection it last rendered.
    pub fn use_store_with<S, F>(&self, selector: F, rerender: RerenderHandle) -> Result<Consumer<V, S>>
    where
        S: Identity + Clone + Send + Sync + 'static,
        F: Fn(&Arc<V>) -> S + Send + Sync + 'static,
    {
        let slot = ProviderScope::lookup::<V>(self.id()).ok_or_else(|| {
            StoreError::MissingProducer {
                store: self.name().to_string(),
            }
        })?;
        Consumer::mount(self.shared_name(), slot, Arc::new(selector), rerender)
    }
}

impl<V, P> Clone for Store<V, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, P> fmt::Debug for Store<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .finish()
    }
}
