//! Packed state word and phase decoding.
//!
//! The counter keeps its whole state in one `u64` so that every transition
//! is a single atomic read-modify-write:
//!
//! ```text
//!  63         62         61 ............................ 0
//! +-----------+----------+--------------------------------+
//! | COMPLETED | QUIESCED |       outstanding count         |
//! +-----------+----------+--------------------------------+
//! ```
//!
//! `QUIESCED` is only ever set together with a zero count, and `COMPLETED`
//! is only ever set alone. Any other combination is unreachable.

use std::fmt;

/// Terminal flag: the completion action has been claimed.
pub(crate) const COMPLETED: u64 = 1 << 63;

/// Retirement flag: a decrement observed zero and a claim is pending.
pub(crate) const QUIESCED: u64 = 1 << 62;

/// Mask of the bits holding the outstanding count.
pub(crate) const COUNT_MASK: u64 = QUIESCED - 1;

/// Largest outstanding count the state word can represent.
pub const MAX_OUTSTANDING: u64 = COUNT_MASK;

/// Lifecycle phase of an outstanding-operations counter.
///
/// ```text
/// Active(n) --decrement to 0--> Quiesced --claim--> Completed
///    ^                              |
///    +------- racing increment -----+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Operations may still be registered.
    Active {
        /// Number of operations currently in flight
        outstanding: u64,
    },
    /// The count reached zero and a claim on the completion action is pending.
    ///
    /// An increment landing in this window revives the counter.
    Quiesced,
    /// The completion action has been claimed. Terminal.
    Completed,
}

impl Phase {
    /// Decode a raw state word.
    pub(crate) fn from_word(word: u64) -> Self {
        if is_completed(word) {
            Phase::Completed
        } else if word & QUIESCED != 0 {
            Phase::Quiesced
        } else {
            Phase::Active {
                outstanding: count(word),
            }
        }
    }

    /// Whether this is the terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Active { outstanding } => write!(f, "active({})", outstanding),
            Phase::Quiesced => write!(f, "quiesced"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

#[inline]
pub(crate) fn is_completed(word: u64) -> bool {
    word & COMPLETED != 0
}

#[inline]
pub(crate) fn count(word: u64) -> u64 {
    word & COUNT_MASK
}

/// Word after registering one more operation, or `None` if the counter is
/// completed or the count is saturated. Reviving a quiesced word drops the
/// retirement flag.
#[inline]
pub(crate) fn incremented(word: u64) -> Option<u64> {
    if is_completed(word) {
        return None;
    }
    let n = count(word);
    if n == MAX_OUTSTANDING {
        return None;
    }
    Some(n + 1)
}

/// Word after returning one operation.
///
/// Reaching zero sets `QUIESCED` in the same update. `None` means the word
/// is completed, or the count is already zero and the caller must apply its
/// underflow policy.
#[inline]
pub(crate) fn decremented(word: u64) -> Option<u64> {
    if is_completed(word) {
        return None;
    }
    match count(word) {
        0 => None,
        1 => Some(QUIESCED),
        n => Some(n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_do_not_overlap() {
        assert_eq!(COMPLETED & QUIESCED, 0);
        assert_eq!(COMPLETED & COUNT_MASK, 0);
        assert_eq!(QUIESCED & COUNT_MASK, 0);
        assert_eq!(COMPLETED | QUIESCED | COUNT_MASK, u64::MAX);
    }

    #[test]
    fn phase_decoding() {
        assert_eq!(Phase::from_word(0), Phase::Active { outstanding: 0 });
        assert_eq!(Phase::from_word(7), Phase::Active { outstanding: 7 });
        assert_eq!(Phase::from_word(QUIESCED), Phase::Quiesced);
        assert_eq!(Phase::from_word(COMPLETED), Phase::Completed);
        assert!(Phase::Completed.is_terminal());
        assert!(!Phase::Quiesced.is_terminal());
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Active { outstanding: 3 }.to_string(), "active(3)");
        assert_eq!(Phase::Quiesced.to_string(), "quiesced");
        assert_eq!(Phase::Completed.to_string(), "completed");
    }

    mod transitions {
        use super::*;

        #[test]
        fn increment_from_active() {
            assert_eq!(incremented(0), Some(1));
            assert_eq!(incremented(41), Some(42));
        }

        #[test]
        fn increment_revives_quiesced() {
            let revived = incremented(QUIESCED).unwrap();
            assert_eq!(revived, 1);
            assert_eq!(Phase::from_word(revived), Phase::Active { outstanding: 1 });
        }

        #[test]
        fn increment_refused_when_completed() {
            assert_eq!(incremented(COMPLETED), None);
        }

        #[test]
        fn increment_refused_at_capacity() {
            assert_eq!(incremented(MAX_OUTSTANDING), None);
        }

        #[test]
        fn decrement_to_zero_quiesces() {
            assert_eq!(decremented(1), Some(QUIESCED));
            assert_eq!(decremented(5), Some(4));
        }

        #[test]
        fn decrement_at_zero_is_underflow() {
            assert_eq!(decremented(0), None);
            assert_eq!(decremented(QUIESCED), None);
        }

        #[test]
        fn decrement_refused_when_completed() {
            assert_eq!(decremented(COMPLETED), None);
        }
    }
}
