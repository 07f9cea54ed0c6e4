//! RAII guards pairing one increment with one decrement.
//!
//! A guard registers an operation when it is created and returns it when it
//! is dropped, so an early return or a panic in the caller cannot leak an
//! outstanding operation.
//!
//! ```rust
//! use outstanding_ops::OutstandingOps;
//! use std::sync::Arc;
//!
//! let ops = Arc::new(OutstandingOps::new(|| println!("all operations finished")));
//!
//! let guard = ops.track_owned();
//! let worker = std::thread::spawn(move || {
//!     // ... perform the operation ...
//!     drop(guard);
//! });
//!
//! worker.join().unwrap();
//! assert!(ops.is_completed());
//! ```

use std::sync::Arc;

use crate::counter::OutstandingOps;

/// Borrowed guard for one outstanding operation.
///
/// If the counter had already completed when the guard was created, nothing
/// was registered and dropping the guard does nothing.
#[must_use = "dropping the guard immediately returns the operation"]
#[derive(Debug)]
pub struct OpGuard<'a> {
    ops: &'a OutstandingOps,
    registered: bool,
}

impl<'a> OpGuard<'a> {
    /// Whether the guard holds a registered operation.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The counter this guard belongs to.
    pub fn counter(&self) -> &'a OutstandingOps {
        self.ops
    }
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        if self.registered {
            self.ops.decrement();
        }
    }
}

/// Owned guard for one outstanding operation; can move across threads.
#[must_use = "dropping the guard immediately returns the operation"]
#[derive(Debug)]
pub struct OwnedOpGuard {
    ops: Arc<OutstandingOps>,
    registered: bool,
}

impl OwnedOpGuard {
    /// Whether the guard holds a registered operation.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The counter this guard belongs to.
    pub fn counter(&self) -> &Arc<OutstandingOps> {
        &self.ops
    }
}

impl Drop for OwnedOpGuard {
    fn drop(&mut self) {
        if self.registered {
            self.ops.decrement();
        }
    }
}

impl OutstandingOps {
    /// Register an operation for the lifetime of the returned guard.
    pub fn track(&self) -> OpGuard<'_> {
        OpGuard {
            ops: self,
            registered: self.try_increment().is_ok(),
        }
    }

    /// Register an operation for the lifetime of the returned guard, which
    /// keeps the counter alive and may be sent to another thread.
    pub fn track_owned(self: &Arc<Self>) -> OwnedOpGuard {
        OwnedOpGuard {
            registered: self.try_increment().is_ok(),
            ops: Arc::clone(self),
        }
    }
}

static_assertions::assert_impl_all!(OwnedOpGuard: Send, Sync);
