//! Provider Scope
//!
//! The provider scope is how a consumer finds the slot of the nearest
//! enclosing producer of its store.
//!
//! # Implementation
//!
//! We use a thread-local stack of installed slots. `Producer::provide` pushes
//! its slot before running the closure that mounts descendants and pops it
//! afterwards. A lookup walks the stack from the top, so the innermost
//! producer of a store shadows any outer producer of the same store, while
//! producers of other stores are transparent.
//!
//! A consumer captures its slot once, at mount time, the same way a
//! component keeps its context binding for as long as it stays at the same
//! position in the tree.

use std::any::Any;
use std::cell::RefCell;

use super::factory::StoreId;
use super::slot::Slot;

thread_local! {
    static SCOPE_STACK: RefCell<Vec<ScopeEntry>> = RefCell::new(Vec::new());
}

/// An installed slot, type-erased so slots of different stores can share
/// one stack.
struct ScopeEntry {
    store_id: StoreId,
    slot_id: u64,
    slot: Box<dyn Any>,
}

/// Guard that uninstalls the slot when dropped.
///
/// This keeps the stack balanced even if mounting descendants panics.
pub struct ProviderScope {
    slot_id: u64,
}

impl ProviderScope {
    /// Install `slot` as the nearest binding for `store_id`.
    pub fn enter<V>(store_id: StoreId, slot: Slot<V>) -> Self
    where
        V: Send + Sync + 'static,
    {
        let slot_id = slot.id();
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().push(ScopeEntry {
                store_id,
                slot_id,
                slot: Box::new(slot),
            });
        });

        Self { slot_id }
    }

    /// Find the nearest installed slot for `store_id`.
    pub fn lookup<V>(store_id: StoreId) -> Option<Slot<V>>
    where
        V: Send + Sync + 'static,
    {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|entry| entry.store_id == store_id)
                .and_then(|entry| entry.slot.downcast_ref::<Slot<V>>().cloned())
        })
    }

    /// Check if any producer scope is active on this thread.
    pub fn is_active() -> bool {
        SCOPE_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Number of installed scopes on this thread.
    pub fn depth() -> usize {
        SCOPE_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ProviderScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.slot_id, self.slot_id,
                    "ProviderScope mismatch: expected slot {}, got {}",
                    self.slot_id, entry.slot_id
                );
            }
        });
    }
}
