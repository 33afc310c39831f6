//! Hookstore Core
//!
//! This crate provides a minimal state-sharing primitive for component-tree
//! applications: one computed value (and the functions that mutate it) is
//! produced once per subtree and consumed selectively by many descendants,
//! each re-rendering only when the slice it reads has changed by identity.
//!
//! It implements:
//!
//! - A store factory built around a value-producing computation
//! - Producers that commit a new value and then notify subscribers
//! - Consumers with selectors and identity-based change detection
//! - Stable callbacks with permanent identity and always-current bodies
//! - A reference render scheduler for hosts
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `store`: producers, consumers, slots, hooks, and stable callbacks
//! - `graph`: the render graph that orders re-render requests
//! - `identity`: the identity comparison used for change detection
//! - `config`: per-store configuration
//! - `error`: error types
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hookstore_core::{create_store, Callback, Hooks, RerenderHandle};
//!
//! struct Counter {
//!     count: i64,
//!     increase: Callback,
//! }
//!
//! let store = create_store(|hooks: &mut Hooks, _: &()| {
//!     let (count, set_count) = hooks.use_state(|| 0_i64);
//!     let increase = hooks.use_event(move |_: ()| set_count.update(|c| c + 1));
//!     Counter { count, increase }
//! });
//!
//! let mut producer = store.mount((), RerenderHandle::noop());
//! let mut count = producer
//!     .provide(|| store.use_store_with(|v: &Arc<Counter>| v.count, RerenderHandle::noop()))
//!     .unwrap();
//!
//! producer.value().increase.call(());
//! producer.update();
//! assert_eq!(count.render().unwrap(), 1);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod store;

pub use config::{EffectTiming, StoreConfig};
pub use error::{Result, StoreError};
pub use identity::Identity;
pub use store::{
    create_shared_store, create_shared_store_with, create_store, create_store_with, Callback,
    Consumer, Hooks, Producer, RerenderHandle, StableCell, StateSetter, Store,
};
