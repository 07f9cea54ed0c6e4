//! The outstanding-operations counter.
//!
//! [`OutstandingOps`] counts in-flight operations and fires a completion
//! action exactly once, on the thread whose decrement brings the count to
//! zero, provided no increment sneaks in before that thread claims the
//! action.
//!
//! # Protocol
//!
//! A decrement that takes the count from 1 to 0 also sets the retirement
//! flag (`QUIESCED`) in the same atomic update. It then tries to claim the
//! completion by swapping the exact word `QUIESCED | 0` for `COMPLETED`.
//! An increment that lands between those two steps rewrites the word to
//! `active(1)`, so the swap fails and completion is deferred to whichever
//! thread next reaches zero. Once `COMPLETED` is set, increments and
//! decrements are no-ops forever.
//!
//! # Example
//!
//! ```rust
//! use outstanding_ops::OutstandingOps;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let fired = Arc::new(AtomicUsize::new(0));
//! let ops = {
//!     let fired = Arc::clone(&fired);
//!     OutstandingOps::new(move || {
//!         fired.fetch_add(1, Ordering::SeqCst);
//!     })
//! };
//!
//! ops.increment();
//! ops.increment();
//! ops.decrement();
//! assert_eq!(fired.load(Ordering::SeqCst), 0);
//!
//! ops.decrement();
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//!
//! // Retired counters ignore further traffic.
//! ops.increment();
//! ops.decrement();
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! ```

use crate::config::{OpsConfig, UnderflowPolicy};
use crate::error::{OutstandingOpsError, Result};
use crate::logging::{LogLevel, Logger};
use crate::state::{self, Phase};
use crate::stats::{OpsStats, StatsRecorder};
use crate::sync::{AtomicU64, Ordering, UnsafeCell};

type CompletionAction = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of returning one operation, before any completion claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// Operations are still outstanding.
    Pending,
    /// The count reached zero; the caller should attempt the claim.
    ReachedZero,
    /// Nothing changed: the counter is completed, or the decrement was a
    /// dropped underflow.
    Ignored,
}

/// Lock-free counter of in-flight operations with an exactly-once
/// completion action.
///
/// Share it by reference or through an `Arc`; every method takes `&self`.
///
/// # Caller contract
///
/// Every successful `increment` must be paired with exactly one
/// `decrement`. A missing decrement keeps the counter alive forever and the
/// completion action never runs. An extra decrement is handled according to
/// the configured [`UnderflowPolicy`].
pub struct OutstandingOps {
    state: AtomicU64,
    action: UnsafeCell<Option<CompletionAction>>,
    underflow: UnderflowPolicy,
    name: Option<String>,
    stats: Option<StatsRecorder>,
    logger: Option<Logger>,
}

// SAFETY: `action` is only accessed by the single thread whose CAS moved the
// state word to `COMPLETED`, or by `Drop` with exclusive access. The action
// itself is `Send`, so running it on that thread is sound. All other fields
// are `Sync`.
unsafe impl Sync for OutstandingOps {}

impl OutstandingOps {
    /// Create a counter in `active(0)` that runs `action` on completion.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::build(Box::new(action), OpsConfig::default(), None)
    }

    /// Create a counter with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OutstandingOpsError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn with_config<F>(action: F, config: OpsConfig) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        config.validate()?;
        let logger = Logger::from_config(&config.logging);
        Ok(Self::build(Box::new(action), config, logger))
    }

    /// Create a counter that logs to `logger` instead of the outputs
    /// described by `config.logging`.
    ///
    /// # Errors
    ///
    /// Returns [`OutstandingOpsError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn with_logger<F>(action: F, config: OpsConfig, logger: Logger) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        config.validate()?;
        Ok(Self::build(Box::new(action), config, Some(logger)))
    }

    fn build(action: CompletionAction, config: OpsConfig, logger: Option<Logger>) -> Self {
        Self {
            state: AtomicU64::new(0),
            action: UnsafeCell::new(Some(action)),
            underflow: config.underflow,
            name: config.name,
            stats: config.stats.enabled.then(StatsRecorder::new),
            logger,
        }
    }

    /// Register the start of an operation.
    ///
    /// After completion this is a silent no-op; use
    /// [`try_increment`](Self::try_increment) to find out.
    #[inline]
    pub fn increment(&self) {
        let _ = self.try_increment();
    }

    /// Register the start of an operation, reporting whether it counted.
    ///
    /// # Errors
    ///
    /// Returns [`OutstandingOpsError::Completed`] if the completion action
    /// has already been claimed. The counter is unchanged in that case and
    /// the caller must not issue the paired decrement.
    ///
    /// # Panics
    ///
    /// Panics if the outstanding count would exceed
    /// [`MAX_OUTSTANDING`](crate::MAX_OUTSTANDING).
    pub fn try_increment(&self) -> Result<()> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let Some(next) = state::incremented(current) else {
                if state::is_completed(current) {
                    if let Some(stats) = &self.stats {
                        stats.record_rejected_increment();
                    }
                    self.log(LogLevel::Trace, 0, "increment ignored after completion");
                    return Err(OutstandingOpsError::Completed);
                }
                panic!("outstanding operation count overflow");
            };

            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    if let Some(stats) = &self.stats {
                        stats.record_increment();
                    }
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Return one operation.
    ///
    /// If this brings the count to zero and no increment intervenes, the
    /// completion action runs synchronously on the calling thread before
    /// this method returns. A panic in the action propagates to the caller;
    /// the action is never run again.
    ///
    /// # Panics
    ///
    /// Panics if nothing is outstanding and the policy is
    /// [`UnderflowPolicy::Panic`].
    #[inline]
    pub fn decrement(&self) {
        if self.release() == Release::ReachedZero {
            self.claim();
        }
    }

    /// First half of `decrement`: drop the count, marking the counter
    /// quiesced if it reaches zero.
    pub(crate) fn release(&self) -> Release {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if state::is_completed(current) {
                return Release::Ignored;
            }

            let (next, underflow) = match state::decremented(current) {
                Some(next) => (next, false),
                None => match self.underflow {
                    UnderflowPolicy::Saturate => (state::QUIESCED, true),
                    UnderflowPolicy::Ignore => {
                        self.record_underflow("decrement without increment ignored");
                        return Release::Ignored;
                    }
                    UnderflowPolicy::Panic => match &self.name {
                        Some(name) => {
                            panic!("decrement without a matching increment on counter `{name}`")
                        }
                        None => panic!("decrement without a matching increment"),
                    },
                },
            };

            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    if underflow {
                        self.record_underflow("decrement without increment treated as zero");
                    } else if let Some(stats) = &self.stats {
                        stats.record_decrement();
                    }

                    return if next == state::QUIESCED {
                        Release::ReachedZero
                    } else {
                        Release::Pending
                    };
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Second half of `decrement`: try to move `quiesced` to `completed` and
    /// run the action. Returns whether this call fired it.
    pub(crate) fn claim(&self) -> bool {
        match self.state.compare_exchange(
            state::QUIESCED,
            state::COMPLETED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                // SAFETY: only one thread can move the word to `COMPLETED`,
                // and nothing else touches the cell until `Drop`.
                let action = self.action.with_mut(|slot| unsafe { (*slot).take() });

                if let Some(stats) = &self.stats {
                    stats.record_completion();
                }
                self.log(LogLevel::Debug, 0, "completion claimed");

                if let Some(action) = action {
                    action();
                }
                true
            }
            Err(actual) => {
                if let Some(stats) = &self.stats {
                    stats.record_lost_claim();
                }
                self.log(
                    LogLevel::Trace,
                    state::count(actual),
                    "completion claim lost to a racing increment",
                );
                false
            }
        }
    }

    /// Number of operations currently outstanding. Zero once completed.
    pub fn outstanding(&self) -> u64 {
        state::count(self.state.load(Ordering::Acquire))
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        Phase::from_word(self.state.load(Ordering::Acquire))
    }

    /// Whether the completion action has been claimed.
    pub fn is_completed(&self) -> bool {
        state::is_completed(self.state.load(Ordering::Acquire))
    }

    /// Event statistics, if enabled in the configuration.
    pub fn stats(&self) -> Option<OpsStats> {
        self.stats.as_ref().map(StatsRecorder::snapshot)
    }

    /// The configured counter name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The configured underflow policy.
    pub fn underflow_policy(&self) -> UnderflowPolicy {
        self.underflow
    }

    fn record_underflow(&self, message: &str) {
        if let Some(stats) = &self.stats {
            stats.record_underflow();
        }
        self.log(LogLevel::Warn, 0, message);
    }

    fn log(&self, level: LogLevel, outstanding: u64, message: &str) {
        if let Some(logger) = &self.logger {
            logger.log_event(level, self.name.as_deref(), outstanding, message);
        }
    }
}

impl Drop for OutstandingOps {
    fn drop(&mut self) {
        let word = self.state.load(Ordering::Acquire);
        if !state::is_completed(word) && state::count(word) > 0 {
            self.log(
                LogLevel::Debug,
                state::count(word),
                "dropped before completion; action discarded",
            );
        }
        if let Some(logger) = &self.logger {
            logger.flush();
        }
    }
}

impl std::fmt::Debug for OutstandingOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutstandingOps")
            .field("name", &self.name)
            .field("phase", &self.phase())
            .field("underflow", &self.underflow)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(OutstandingOps: Send, Sync);
