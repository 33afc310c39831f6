//! Store Primitives
//!
//! This module implements the subscription/notification engine: a producer
//! computes a value once per update and shares it through a slot; consumers
//! read it, optionally through a selector, and re-render only when their
//! selection changes.
//!
//! # Concepts
//!
//! ## Producers
//!
//! A Producer is a mounted instance of a store. It runs the store's
//! computation, commits the result into its slot, and then notifies every
//! subscribed consumer. Mounting the same store twice yields two independent
//! producers whose consumers never see each other's updates.
//!
//! ## Consumers
//!
//! A Consumer binds to the nearest enclosing producer of its store when it
//! mounts. On every notification its listener compares the new value, and
//! then the new selection, against what it last rendered. Only a change in
//! identity leads to a re-render request.
//!
//! ## Stable Callbacks
//!
//! A computation that hands out mutators wraps them with
//! [`Hooks::use_event`]. The resulting [`Callback`] keeps its identity for
//! the producer's lifetime, so a consumer selecting only the mutator never
//! re-renders because of it.
//!
//! # Implementation Notes
//!
//! The engine never schedules work itself. Producers and consumers are
//! given a [`RerenderHandle`] and only ever call it; the host decides when to
//! run `Producer::update` and `Consumer::render`.

mod callback;
mod consumer;
mod factory;
mod hooks;
mod listener;
mod producer;
mod scope;
mod slot;

pub use callback::{Callback, StableCell};
pub use consumer::{Consumer, Selector};
pub use factory::{
    create_shared_store, create_shared_store_with, create_store, create_store_with, Store, StoreId,
};
pub use hooks::{Hooks, StateSetter};
pub use listener::{Listener, ListenerId, RerenderHandle};
pub use producer::Producer;
pub use scope::ProviderScope;
pub use slot::Slot;
