//! Stable Callbacks
//!
//! A stable callback has a permanent identity but always runs the most
//! recently committed body. Computations hand these out as mutators so a
//! consumer selecting only the mutator never sees it change, while the body
//! still closes over current state.
//!
//! # How It Works
//!
//! 1. `StableCell::new` allocates a shared cell holding the first body and
//!    returns the owner side. `StableCell::callback` hands out `Callback`
//!    handles that all point at the same cell.
//!
//! 2. During a render the owner calls `stage` with the new body. Callers
//!    keep running the previously committed body.
//!
//! 3. In the post-commit phase the owner calls `commit`, swapping the staged
//!    body in. A call that races a render therefore always runs a body from a
//!    single committed render.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::identity::Identity;

type Body<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;

struct CallbackCell<A, R> {
    current: RwLock<Body<A, R>>,
    staged: Mutex<Option<Body<A, R>>>,
}

/// A function handle with permanent identity.
///
/// Clones share the cell; equality is identity of the cell.
pub struct Callback<A = (), R = ()> {
    cell: Arc<CallbackCell<A, R>>,
}

impl<A, R> Callback<A, R>
where
    A: 'static,
    R: 'static,
{
    /// Invoke the currently committed body.
    pub fn call(&self, args: A) -> R {
        // Clone the body out so the lock is not held while it runs; the body
        // may stage or commit a new body on this same cell.
        let body = Arc::clone(&self.cell.current.read());
        body(args)
    }

    /// Check whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<A, R> Clone for Callback<A, R> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A, R> PartialEq for Callback<A, R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<A, R> Eq for Callback<A, R> {}

impl<A, R> Identity for Callback<A, R> {
    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<A, R> fmt::Debug for Callback<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("cell", &Arc::as_ptr(&self.cell))
            .finish()
    }
}

/// Owner side of a stable callback.
pub struct StableCell<A = (), R = ()> {
    callback: Callback<A, R>,
}

impl<A, R> StableCell<A, R>
where
    A: 'static,
    R: 'static,
{
    /// Create a cell with `body` as its first committed body.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            callback: Callback {
                cell: Arc::new(CallbackCell {
                    current: RwLock::new(Arc::new(body)),
                    staged: Mutex::new(None),
                }),
            },
        }
    }

    /// Get a handle to the cell. Every handle is identical.
    pub fn callback(&self) -> Callback<A, R> {
        self.callback.clone()
    }

    /// Stage a new body. It becomes current on the next `commit`.
    pub fn stage<F>(&self, body: F)
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        *self.callback.cell.staged.lock() = Some(Arc::new(body));
    }

    /// Make the staged body current. Returns `false` if nothing was staged.
    pub fn commit(&self) -> bool {
        let staged = self.callback.cell.staged.lock().take();
        match staged {
            Some(body) => {
                *self.callback.cell.current.write() = body;
                true
            }
            None => false,
        }
    }

    /// Stage and commit in one step.
    pub fn replace<F>(&self, body: F)
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.stage(body);
        self.commit();
    }

    /// Check whether a body is waiting for `commit`.
    pub fn has_staged(&self) -> bool {
        self.callback.cell.staged.lock().is_some()
    }
}

impl<A, R> fmt::Debug for StableCell<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StableCell")
            .field("callback", &self.callback)
            .finish()
    }
}
