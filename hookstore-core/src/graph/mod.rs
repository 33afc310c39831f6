//! Render Graph
//!
//! A reference host for the store engine. The engine only ever calls a
//! `RerenderHandle`; this module turns those calls into an ordered work list.
//!
//! # Overview
//!
//! The graph is a DAG where:
//!
//! - Nodes are mounted producers and consumers
//! - Edges run from a producer to each consumer bound to it
//!
//! Re-render requests mark nodes dirty. Draining returns the dirty nodes in
//! topological order so a producer always commits before its consumers read.
//!
//! # Design Decisions
//!
//! 1. Requests are collected, not executed. A listener fires while its
//!    producer is mid-notification, and re-rendering from inside it would
//!    re-enter the host.
//!
//! 2. Nodes are kept in mount order so that drains are deterministic.

mod node;
mod scheduler;

pub use node::{DirtyState, Node, NodeId, NodeKind};
pub use scheduler::{SharedScheduler, UpdateScheduler};
