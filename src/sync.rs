//! Synchronization primitives that switch to `loom` under `cfg(outstanding_ops_loom)`.
//!
//! Everything the counter shares between threads is imported from here so
//! that the loom test suite explores the real state machine rather than a
//! copy of it.

#[cfg(outstanding_ops_loom)]
pub(crate) use loom::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(outstanding_ops_loom))]
pub(crate) use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(outstanding_ops_loom)]
pub(crate) use loom::cell::UnsafeCell;

/// `std` counterpart of `loom::cell::UnsafeCell` exposing the same closure API.
#[cfg(not(outstanding_ops_loom))]
#[derive(Debug)]
pub(crate) struct UnsafeCell<T>(std::cell::UnsafeCell<T>);

#[cfg(not(outstanding_ops_loom))]
impl<T> UnsafeCell<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(std::cell::UnsafeCell::new(value))
    }

    /// Run `f` with a raw mutable pointer to the contents.
    ///
    /// The caller is responsible for guaranteeing exclusive access while the
    /// pointer is dereferenced.
    #[inline]
    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
        f(self.0.get())
    }
}
