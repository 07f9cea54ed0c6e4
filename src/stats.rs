//! Event statistics for outstanding-operations counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a counter's event totals.
///
/// Counters are updated with relaxed ordering, so a snapshot taken while
/// other threads are active may be slightly inconsistent across fields.
///
/// # Examples
///
/// ```rust
/// use outstanding_ops::{OpsConfig, OutstandingOps};
///
/// let ops = OutstandingOps::with_config(|| {}, OpsConfig::testing()).unwrap();
/// ops.increment();
/// ops.decrement();
///
/// let stats = ops.stats().unwrap();
/// assert_eq!(stats.increments, 1);
/// assert_eq!(stats.completions, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpsStats {
    /// Increments that registered an operation
    pub increments: u64,
    /// Increments ignored because the counter had completed
    pub rejected_increments: u64,
    /// Decrements that returned an operation
    pub decrements: u64,
    /// Decrements that arrived with nothing outstanding
    pub underflows: u64,
    /// Zero crossings whose claim found the counter revived or already claimed
    pub lost_claims: u64,
    /// Completion actions fired (0 or 1)
    pub completions: u64,
}

impl OpsStats {
    /// Accepted increments not yet matched by a decrement.
    pub fn net_outstanding(&self) -> u64 {
        self.increments.saturating_sub(self.decrements)
    }

    /// Share of zero crossings that lost their claim to a racing increment,
    /// as a percentage (0.0 to 100.0).
    ///
    /// Returns 0.0 if no zero crossing has been attempted.
    pub fn race_rate_percent(&self) -> f64 {
        let attempts = self.lost_claims + self.completions;
        if attempts == 0 {
            0.0
        } else {
            (self.lost_claims as f64 / attempts as f64) * 100.0
        }
    }
}

/// Relaxed event counters backing [`OpsStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    increments: AtomicU64,
    rejected_increments: AtomicU64,
    decrements: AtomicU64,
    underflows: AtomicU64,
    lost_claims: AtomicU64,
    completions: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_increment(&self) {
        self.increments.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected_increment(&self) {
        self.rejected_increments.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_decrement(&self) {
        self.decrements.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_underflow(&self) {
        self.underflows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_lost_claim(&self) {
        self.lost_claims.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_completion(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> OpsStats {
        OpsStats {
            increments: self.increments.load(Ordering::Relaxed),
            rejected_increments: self.rejected_increments.load(Ordering::Relaxed),
            decrements: self.decrements.load(Ordering::Relaxed),
            underflows: self.underflows.load(Ordering::Relaxed),
            lost_claims: self.lost_claims.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
        }
    }
}
