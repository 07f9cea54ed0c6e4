//! Error types for the fallible outstanding-ops surfaces.
//!
//! The core `increment` / `decrement` pair never fails. Errors only surface
//! from the reporting variants (`try_increment`), configuration validation,
//! and log outputs.

use thiserror::Error;

/// Result type alias for outstanding-ops operations.
pub type Result<T> = std::result::Result<T, OutstandingOpsError>;

/// Error type for outstanding-ops operations.
///
/// # Design Notes
///
/// - Uses `thiserror` for the `Error` implementation
/// - `std::io::Error` converts automatically via `#[from]`
/// - All variants are `Send + Sync` so errors can cross thread boundaries
#[derive(Debug, Error)]
pub enum OutstandingOpsError {
    /// The counter already fired its completion action.
    ///
    /// Returned by `try_increment` when an operation is registered after the
    /// counter reached its terminal phase. The plain `increment` swallows
    /// this condition.
    #[error("Counter already completed")]
    Completed,

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected
        reason: String,
    },

    /// A mutex guarding a log output was poisoned by a panicking writer.
    #[error("Log output lock is poisoned")]
    LockPoisoned,

    /// Standard I/O error, raised by file log outputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OutstandingOpsError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

static_assertions::assert_impl_all!(OutstandingOpsError: Send, Sync);
