//! Producer Hooks
//!
//! `Hooks` is the per-producer state a computation uses across renders.
//! Hook calls are matched to stored state by call order, so a computation
//! must call the same hooks in the same order on every render.
//!
//! # Available Hooks
//!
//! - [`Hooks::use_state`] - state with a setter that schedules a producer update
//! - [`Hooks::use_event`] - a stable callback whose body follows the latest render
//! - [`Hooks::use_memo`] - a shared value recomputed only when its deps change
//! - [`Hooks::use_ref`] - a mutable cell that never triggers updates
//!
//! # Example
//!
//! ```rust
//! use hookstore_core::{create_store, Callback, Hooks};
//!
//! struct Counter {
//!     count: i64,
//!     increase: Callback,
//! }
//!
//! let store = create_store(|hooks: &mut Hooks, _props: &()| {
//!     let (count, set_count) = hooks.use_state(|| 0_i64);
//!     let increase = hooks.use_event(move |_: ()| set_count.update(|c| c + 1));
//!     Counter { count, increase }
//! });
//! # let _ = store;
//! ```

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::callback::{Callback, StableCell};
use super::listener::RerenderHandle;

/// Anything holding a staged body that must be committed post-commit.
trait StagedCommit: Send + Sync {
    fn commit_staged(&self) -> bool;
}

impl<A, R> StagedCommit for StableCell<A, R>
where
    A: 'static,
    R: 'static,
{
    fn commit_staged(&self) -> bool {
        self.commit()
    }
}

struct MemoSlot<D, T> {
    deps: D,
    value: Arc<T>,
}

// `use_state` and `use_ref` both keep an `Arc<Mutex<T>>`; distinct wrappers
// keep a swap between them from downcasting successfully.
struct StateSlot<T>(Arc<Mutex<T>>);

struct RefSlot<T>(Arc<Mutex<T>>);

/// Ordered hook state of one producer.
pub struct Hooks {
    slots: Vec<Box<dyn Any + Send + Sync>>,
    cursor: usize,
    renders: usize,
    events: Vec<Arc<dyn StagedCommit>>,
    dirty: Arc<AtomicBool>,
    rerender: RerenderHandle,
}

impl Hooks {
    /// Create empty hook state. `rerender` is the owning producer's handle.
    pub fn new(rerender: RerenderHandle) -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            renders: 0,
            events: Vec::new(),
            dirty: Arc::new(AtomicBool::new(false)),
            rerender,
        }
    }

    /// Start a render pass.
    pub(crate) fn begin_render(&mut self) {
        self.cursor = 0;
        self.dirty.store(false, Ordering::SeqCst);
    }

    /// Finish a render pass.
    ///
    /// # Panics
    ///
    /// Panics if a re-render called a different number of hooks than the
    /// first render.
    pub(crate) fn end_render(&mut self) {
        if self.renders > 0 {
            assert_eq!(
                self.cursor,
                self.slots.len(),
                "computation called {} hooks, previous renders called {}",
                self.cursor,
                self.slots.len()
            );
        }
        self.renders += 1;
    }

    /// Commit every staged `use_event` body. Returns how many changed.
    pub(crate) fn commit_events(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.commit_staged())
            .count()
    }

    /// Check whether a state setter has requested an update since the last
    /// render began.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Mark the owning producer as needing an update.
    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Number of completed renders.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Number of hook slots in use.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether no hooks have been called yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn is_first_render(&self) -> bool {
        self.renders == 0
    }

    /// Append a slot during the first render.
    ///
    /// # Panics
    ///
    /// Panics on later renders: a re-render may not add hooks.
    fn push_slot<T>(&mut self, value: T)
    where
        T: Any + Send + Sync,
    {
        assert!(
            self.is_first_render(),
            "computation called more hooks than on its first render"
        );
        self.slots.push(Box::new(value));
        self.cursor += 1;
    }

    /// Fetch the slot at the cursor on a re-render.
    ///
    /// # Panics
    ///
    /// Panics if the slot is missing or holds a different hook kind.
    fn existing_slot<T>(&mut self, kind: &'static str) -> &mut T
    where
        T: Any + Send + Sync,
    {
        let index = self.cursor;
        self.cursor += 1;

        let Some(slot) = self.slots.get_mut(index) else {
            panic!("computation called more hooks than on its first render");
        };
        match slot.downcast_mut::<T>() {
            Some(slot) => slot,
            None => panic!("hook #{index} changed kind between renders; expected {kind}"),
        }
    }

    /// Declare a piece of state.
    ///
    /// Returns the current value and a setter. Calling the setter stores the
    /// new value and requests a producer update.
    pub fn use_state<T, F>(&mut self, init: F) -> (T, StateSetter<T>)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let state = if self.is_first_render() {
            let state = Arc::new(Mutex::new(init()));
            self.push_slot(StateSlot(Arc::clone(&state)));
            state
        } else {
            Arc::clone(&self.existing_slot::<StateSlot<T>>("use_state").0)
        };

        let value = state.lock().clone();
        let setter = StateSetter {
            state,
            dirty: Arc::clone(&self.dirty),
            rerender: self.rerender.clone(),
        };
        (value, setter)
    }

    /// Declare a stable callback.
    ///
    /// The returned `Callback` is the same on every render. `body` replaces
    /// the previous body once the producer runs its post-commit phase.
    pub fn use_event<A, R, F>(&mut self, body: F) -> Callback<A, R>
    where
        A: 'static,
        R: 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        if self.is_first_render() {
            let cell = Arc::new(StableCell::new(body));
            let callback = cell.callback();
            self.events.push(Arc::clone(&cell) as Arc<dyn StagedCommit>);
            self.push_slot(cell);
            return callback;
        }

        let cell = self.existing_slot::<Arc<StableCell<A, R>>>("use_event");
        cell.stage(body);
        cell.callback()
    }

    /// Declare a memoized value.
    ///
    /// `compute` runs on first render and whenever `deps` differs from the
    /// previous render's deps; otherwise the previous `Arc` is returned.
    pub fn use_memo<T, D, F>(&mut self, deps: D, compute: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        D: PartialEq + Send + Sync + 'static,
        F: FnOnce(&D) -> T,
    {
        if self.is_first_render() {
            let value = Arc::new(compute(&deps));
            self.push_slot(MemoSlot {
                deps,
                value: Arc::clone(&value),
            });
            return value;
        }

        let slot = self.existing_slot::<MemoSlot<D, T>>("use_memo");
        if slot.deps != deps {
            slot.value = Arc::new(compute(&deps));
            slot.deps = deps;
        }
        Arc::clone(&slot.value)
    }

    /// Declare a mutable cell that persists across renders.
    pub fn use_ref<T, F>(&mut self, init: F) -> Arc<Mutex<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T,
    {
        if self.is_first_render() {
            let cell = Arc::new(Mutex::new(init()));
            self.push_slot(RefSlot(Arc::clone(&cell)));
            return cell;
        }
        Arc::clone(&self.existing_slot::<RefSlot<T>>("use_ref").0)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("slots", &self.slots.len())
            .field("events", &self.events.len())
            .field("renders", &self.renders)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// Setter returned by [`Hooks::use_state`].
pub struct StateSetter<T> {
    state: Arc<Mutex<T>>,
    dirty: Arc<AtomicBool>,
    rerender: RerenderHandle,
}

impl<T> StateSetter<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Replace the state and request an update.
    pub fn set(&self, value: T) {
        *self.state.lock() = value;
        self.schedule();
    }

    /// Derive the next state from the current one and request an update.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        // Run `f` unlocked so it may read the state through any setter.
        let current = self.state.lock().clone();
        let next = f(&current);
        *self.state.lock() = next;
        self.schedule();
    }

    /// Read the latest stored state, including updates not yet rendered.
    pub fn get(&self) -> T {
        self.state.lock().clone()
    }

    fn schedule(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        self.rerender.request();
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            dirty: Arc::clone(&self.dirty),
            rerender: self.rerender.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn render<R>(hooks: &mut Hooks, body: impl FnOnce(&mut Hooks) -> R) -> R {
        hooks.begin_render();
        let out = body(hooks);
        hooks.end_render();
        out
    }

    #[test]
    fn state_persists_and_setter_requests_update() {
        let requests = Arc::new(AtomicUsize::new(0));
        let requests_clone = requests.clone();
        let mut hooks = Hooks::new(RerenderHandle::new(move || {
            requests_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let (count, set_count) = render(&mut hooks, |h| h.use_state(|| 5));
        assert_eq!(count, 5);
        assert!(!hooks.is_dirty());

        set_count.update(|c| c * 2);
        assert!(hooks.is_dirty());
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert_eq!(set_count.get(), 10);

        let (count, _) = render(&mut hooks, |h| h.use_state(|| 0));
        assert_eq!(count, 10);
        assert!(!hooks.is_dirty());
    }

    #[test]
    fn event_identity_is_stable_and_body_commits_post_render() {
        let mut hooks = Hooks::new(RerenderHandle::noop());

        let first = render(&mut hooks, |h| h.use_event(|_: ()| 1));
        assert_eq!(first.call(()), 1);

        let second = render(&mut hooks, |h| h.use_event(|_: ()| 2));
        assert_eq!(first, second);
        // Staged, not yet committed.
        assert_eq!(second.call(()), 1);

        assert_eq!(hooks.commit_events(), 1);
        assert_eq!(first.call(()), 2);
        assert_eq!(hooks.commit_events(), 0);
    }

    #[test]
    fn memo_recomputes_only_on_dep_change() {
        let mut hooks = Hooks::new(RerenderHandle::noop());
        let runs = Arc::new(AtomicUsize::new(0));

        let compute = |runs: Arc<AtomicUsize>| {
            move |dep: &u32| {
                runs.fetch_add(1, Ordering::SeqCst);
                dep * 10
            }
        };

        let a = render(&mut hooks, |h| h.use_memo(1_u32, compute(runs.clone())));
        let b = render(&mut hooks, |h| h.use_memo(1_u32, compute(runs.clone())));
        let c = render(&mut hooks, |h| h.use_memo(2_u32, compute(runs.clone())));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&b, &c));
        assert_eq!(*c, 20);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ref_is_shared_across_renders() {
        let mut hooks = Hooks::new(RerenderHandle::noop());

        let cell = render(&mut hooks, |h| h.use_ref(|| 0_u32));
        *cell.lock() += 3;
        let again = render(&mut hooks, |h| h.use_ref(|| 0_u32));
        assert_eq!(*again.lock(), 3);
        assert_eq!(hooks.renders(), 2);
        assert_eq!(hooks.len(), 1);
    }

    #[test]
    #[should_panic(expected = "changed kind")]
    fn changing_hook_kind_panics() {
        let mut hooks = Hooks::new(RerenderHandle::noop());
        render(&mut hooks, |h| {
            h.use_state(|| 0_u8);
        });
        render(&mut hooks, |h| {
            h.use_memo(0_u8, |dep| *dep);
        });
    }

    #[test]
    #[should_panic(expected = "changed kind")]
    fn swapping_state_for_ref_panics() {
        let mut hooks = Hooks::new(RerenderHandle::noop());
        render(&mut hooks, |h| h.use_state(|| 7_u8).0);
        render(&mut hooks, |h| *h.use_ref(|| 0_u8).lock());
    }

    #[test]
    #[should_panic(expected = "changed kind")]
    fn swapping_ref_for_state_panics() {
        let mut hooks = Hooks::new(RerenderHandle::noop());
        render(&mut hooks, |h| *h.use_ref(|| 0_u8).lock());
        render(&mut hooks, |h| h.use_state(|| 7_u8).0);
    }

    #[test]
    fn update_may_read_through_another_setter() {
        let mut hooks = Hooks::new(RerenderHandle::noop());
        let (_, set_count) = render(&mut hooks, |h| h.use_state(|| 2_u32));
        let reader = set_count.clone();

        set_count.update(|c| c + reader.get());
        assert_eq!(set_count.get(), 4);
    }

    #[test]
    #[should_panic(expected = "hooks, previous renders called")]
    fn changing_hook_count_panics() {
        let mut hooks = Hooks::new(RerenderHandle::noop());
        render(&mut hooks, |h| {
            h.use_state(|| 0_u8);
            h.use_state(|| 1_u8);
        });
        render(&mut hooks, |h| {
            h.use_state(|| 0_u8);
        });
    }
}
