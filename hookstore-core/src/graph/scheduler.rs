//! Update Scheduler
//!
//! The scheduler collects re-render requests and hands them back to the host
//! in an order where every producer is processed before the consumers bound
//! to it.
//!
//! # Algorithm
//!
//! 1. A `RerenderHandle` built by `SharedScheduler::rerender_handle` marks
//!    its node dirty. Repeated requests before a drain collapse into one.
//! 2. `take_dirty` collects the dirty nodes, sorts them topologically over
//!    the producer → consumer edges, and marks them clean.
//! 3. The host updates each producer (which may dirty more consumers through
//!    their listeners) and renders each consumer, then drains again until
//!    nothing is dirty.
//!
//! Because a consumer can appear at most once per drain, it re-renders at
//! most once per producer update.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::node::{Node, NodeId, NodeKind};
use crate::store::RerenderHandle;

/// The render graph: mounted nodes, their edges, and dirty flags.
#[derive(Debug)]
pub struct UpdateScheduler {
    /// All nodes in the graph, in mount order.
    nodes: IndexMap<NodeId, Node>,
}

impl UpdateScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the graph.
    ///
    /// Also removes all edges involving this node.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.shift_remove(&node_id) {
            for dep_id in node.dependencies() {
                if let Some(dep) = self.nodes.get_mut(dep_id) {
                    dep.remove_dependent(node_id);
                }
            }

            for dependent_id in node.dependents() {
                if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                    dependent.remove_dependency(node_id);
                }
            }
        }
    }

    /// Get a reference to a node.
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable reference to a node.
    pub fn get_node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Bind `consumer` to `producer`.
    pub fn add_edge(&mut self, producer: NodeId, consumer: NodeId) {
        if let Some(node) = self.nodes.get_mut(&producer) {
            node.add_dependent(consumer);
        }
        if let Some(node) = self.nodes.get_mut(&consumer) {
            node.add_dependency(producer);
        }
    }

    /// Remove a binding.
    pub fn remove_edge(&mut self, producer: NodeId, consumer: NodeId) {
        if let Some(node) = self.nodes.get_mut(&producer) {
            node.remove_dependent(consumer);
        }
        if let Some(node) = self.nodes.get_mut(&consumer) {
            node.remove_dependency(producer);
        }
    }

    /// Record a re-render request. Unknown (unmounted) nodes are ignored.
    pub fn mark_dirty(&mut self, node_id: NodeId) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.mark_dirty();
                true
            }
            None => {
                tracing::trace!(node = node_id.raw(), "re-render requested for unmounted node");
                false
            }
        }
    }

    /// Check whether any node is waiting for a re-render.
    pub fn has_dirty(&self) -> bool {
        self.nodes.values().any(|node| !node.is_clean())
    }

    /// Take every dirty node, producers before their consumers, and mark
    /// them clean.
    pub fn take_dirty(&mut self) -> Vec<NodeId> {
        let dirty: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| !node.is_clean())
            .map(Node::id)
            .collect();

        for id in &dirty {
            if let Some(node) = self.nodes.get_mut(id) {
                node.mark_clean();
            }
        }

        self.topological_sort(dirty)
    }

    /// Perform a topological sort of the given nodes.
    ///
    /// Returns nodes in order such that producers come before consumers.
    fn topological_sort(&self, nodes: Vec<NodeId>) -> Vec<NodeId> {
        let node_set: HashSet<_> = nodes.iter().copied().collect();
        let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
        let mut result = Vec::with_capacity(nodes.len());
        let mut queue = VecDeque::new();

        // Only count edges within the node set.
        for &node_id in &nodes {
            if let Some(node) = self.nodes.get(&node_id) {
                let degree = node
                    .dependencies()
                    .iter()
                    .filter(|d| node_set.contains(d))
                    .count();
                in_degree.insert(node_id, degree);
                if degree == 0 {
                    queue.push_back(node_id);
                }
            }
        }

        // Kahn's algorithm
        while let Some(node_id) = queue.pop_front() {
            result.push(node_id);

            if let Some(node) = self.nodes.get(&node_id) {
                for &dependent_id in node.dependents() {
                    if let Some(degree) = in_degree.get_mut(&dependent_id) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(dependent_id);
                        }
                    }
                }
            }
        }

        result
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the kind of a node.
    pub fn kind(&self, node_id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&node_id).map(Node::kind)
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to an `UpdateScheduler`, used to build re-render handles.
#[derive(Debug, Clone, Default)]
pub struct SharedScheduler {
    inner: Arc<Mutex<UpdateScheduler>>,
}

impl SharedScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer node.
    pub fn add_producer(&self) -> NodeId {
        self.inner.lock().add_node(Node::producer())
    }

    /// Register a consumer node bound to `producer`.
    pub fn add_consumer(&self, producer: NodeId) -> NodeId {
        let mut scheduler = self.inner.lock();
        let id = scheduler.add_node(Node::consumer());
        scheduler.add_edge(producer, id);
        id
    }

    /// Remove a node on unmount.
    pub fn remove(&self, node_id: NodeId) {
        self.inner.lock().remove_node(node_id);
    }

    /// Build the re-render capability for `node_id`.
    pub fn rerender_handle(&self, node_id: NodeId) -> RerenderHandle {
        let inner = Arc::clone(&self.inner);
        RerenderHandle::new(move || {
            inner.lock().mark_dirty(node_id);
        })
    }

    /// Take every dirty node in processing order.
    pub fn take_dirty(&self) -> Vec<NodeId> {
        self.inner.lock().take_dirty()
    }

    /// Check whether any node is waiting for a re-render.
    pub fn has_dirty(&self) -> bool {
        self.inner.lock().has_dirty()
    }

    /// Get the kind of a node.
    pub fn kind(&self, node_id: NodeId) -> Option<NodeKind> {
        self.inner.lock().kind(node_id)
    }

    /// Get the number of mounted nodes.
    pub fn node_count(&self) -> usize {
        self.inner.lock().node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_nodes() {
        let mut scheduler = UpdateScheduler::new();

        let id1 = scheduler.add_node(Node::producer());
        let id2 = scheduler.add_node(Node::consumer());
        scheduler.add_edge(id1, id2);

        assert_eq!(scheduler.node_count(), 2);

        scheduler.remove_node(id1);
        assert_eq!(scheduler.node_count(), 1);
        assert!(scheduler.get_node(id1).is_none());
        assert!(scheduler.get_node(id2).unwrap().dependencies().is_empty());
    }

    #[test]
    fn add_and_remove_edges() {
        let mut scheduler = UpdateScheduler::new();

        let producer = scheduler.add_node(Node::producer());
        let consumer = scheduler.add_node(Node::consumer());

        scheduler.add_edge(producer, consumer);
        assert!(scheduler
            .get_node(producer)
            .unwrap()
            .dependents()
            .contains(&consumer));
        assert!(scheduler
            .get_node(consumer)
            .unwrap()
            .dependencies()
            .contains(&producer));

        scheduler.remove_edge(producer, consumer);
        assert!(scheduler.get_node(producer).unwrap().dependents().is_empty());
        assert!(scheduler.get_node(consumer).unwrap().dependencies().is_empty());
    }

    #[test]
    fn producers_drain_before_consumers() {
        let mut scheduler = UpdateScheduler::new();

        // Consumer registered first, still processed after its producer.
        let consumer = scheduler.add_node(Node::consumer());
        let producer = scheduler.add_node(Node::producer());
        scheduler.add_edge(producer, consumer);

        scheduler.mark_dirty(consumer);
        scheduler.mark_dirty(producer);

        let order = scheduler.take_dirty();
        assert_eq!(order, vec![producer, consumer]);
        assert!(!scheduler.has_dirty());
    }

    #[test]
    fn repeated_requests_collapse() {
        let shared = SharedScheduler::new();
        let producer = shared.add_producer();
        let consumer = shared.add_consumer(producer);
        let handle = shared.rerender_handle(consumer);

        handle.request();
        handle.request();
        handle.request();

        assert_eq!(shared.take_dirty(), vec![consumer]);
        assert!(shared.take_dirty().is_empty());
        assert_eq!(shared.kind(consumer), Some(NodeKind::Consumer));
    }

    #[test]
    fn requests_for_removed_nodes_are_ignored() {
        let shared = SharedScheduler::new();
        let producer = shared.add_producer();
        let handle = shared.rerender_handle(producer);

        shared.remove(producer);
        handle.request();
        assert!(!shared.has_dirty());
        assert_eq!(shared.node_count(), 0);
    }
}
