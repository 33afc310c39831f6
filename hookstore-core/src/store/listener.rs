//! Listener and re-render handle types.
//!
//! A Listener is the per-consumer callback a slot invokes after each
//! producer commit. A `RerenderHandle` is the capability a component is given
//! to ask its host for a local re-render.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a listener registered on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked with the newly committed value of a slot.
pub type Listener<V> = Arc<dyn Fn(&Arc<V>) + Send + Sync>;

/// Capability to request a re-render of one component.
///
/// The store never re-renders anything itself; it only calls this handle.
/// Hosts map it onto whatever scheduling they have: a dirty queue, a message
/// to an event loop, or a direct call in tests.
#[derive(Clone)]
pub struct RerenderHandle {
    request: Arc<dyn Fn() + Send + Sync>,
}

impl RerenderHandle {
    /// Wrap a request function.
    pub fn new<F>(request: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            request: Arc::new(request),
        }
    }

    /// A handle that ignores requests.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Ask the host to re-render the owning component.
    pub fn request(&self) {
        (self.request)();
    }
}

impl fmt::Debug for RerenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RerenderHandle").finish_non_exhaustive()
    }
}
