//! # outstanding-ops: exactly-once completion for in-flight operations
//!
//! A lock-free counter of outstanding operations that runs a completion
//! action **exactly once**, on the thread whose decrement brings the count
//! to zero, and never again afterwards.
//!
//! The owner of the counter (a cache, a recipe, a connection) calls
//! [`increment`](OutstandingOps::increment) when an operation starts and
//! [`decrement`](OutstandingOps::decrement) when it finishes. The counter
//! handles the awkward race where a new operation is registered at the very
//! instant the count is reaching zero: that operation wins, completion is
//! deferred, and the action runs once it too has finished.
//!
//! ## Quick Start
//!
//! ```rust
//! use outstanding_ops::OutstandingOps;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let done = Arc::new(AtomicBool::new(false));
//! let ops = Arc::new({
//!     let done = Arc::clone(&done);
//!     OutstandingOps::new(move || done.store(true, Ordering::SeqCst))
//! });
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let guard = ops.track_owned();
//!         std::thread::spawn(move || {
//!             // ... do the work, then release the operation ...
//!             drop(guard);
//!         })
//!     })
//!     .collect();
//!
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! assert!(done.load(Ordering::SeqCst));
//! ```
//!
//! ## Guarantees
//!
//! - The completion action runs at most once, and exactly once if every
//!   increment is paired with a decrement.
//! - An increment that happens-before the final decrement keeps the action
//!   from running until its own decrement.
//! - After completion, increments and decrements have no effect.
//! - Every operation is a handful of atomic instructions; nothing blocks.
//!
//! ## Caller Responsibilities
//!
//! The counter does not track operation identity. An increment without a
//! decrement keeps the counter alive forever; a decrement without an
//! increment is handled by the configured [`UnderflowPolicy`].
//!
//! ## Configuration
//!
//! ```rust
//! use outstanding_ops::{ConfigBuilder, OutstandingOps, UnderflowPolicy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigBuilder::new()
//!     .name("path-cache")
//!     .underflow(UnderflowPolicy::Ignore)
//!     .stats(true)
//!     .build()?;
//!
//! let ops = OutstandingOps::with_config(|| {}, config)?;
//! ops.decrement(); // ignored: nothing outstanding
//! assert_eq!(ops.stats().unwrap().underflows, 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod counter;
pub mod error;
pub mod guard;
pub mod logging;
pub mod state;
pub mod stats;
mod sync;

pub use config::{ConfigBuilder, LoggingConfig, OpsConfig, StatsConfig, UnderflowPolicy};
pub use counter::OutstandingOps;
pub use error::{OutstandingOpsError, Result};
pub use guard::{OpGuard, OwnedOpGuard};
pub use logging::{LogLevel, Logger, MemoryOutput};
pub use state::{Phase, MAX_OUTSTANDING};
pub use stats::OpsStats;
