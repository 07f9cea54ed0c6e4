//! Loom-based exhaustive interleaving tests for the completion protocol.
//!
//! Run with `RUSTFLAGS="--cfg outstanding_ops_loom" cargo test --test loom_concurrency --release`.

#![cfg(outstanding_ops_loom)]

use loom::sync::atomic::{AtomicUsize, Ordering};
use loom::sync::Arc;
use loom::thread;
use outstanding_ops::OutstandingOps;

fn counting() -> (Arc<OutstandingOps>, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let ops = {
        let fired = Arc::clone(&fired);
        OutstandingOps::new(move || {
            fired.fetch_add(1, Ordering::SeqCst);
        })
    };
    (Arc::new(ops), fired)
}

/// A decrement to zero racing an increment: the increment either lands
/// first (and defers completion) or is rejected after completion.
#[test]
fn test_increment_races_zero_crossing() {
    loom::model(|| {
        let (ops, fired) = counting();
        ops.increment();

        let racer = {
            let ops = Arc::clone(&ops);
            let fired = Arc::clone(&fired);
            thread::spawn(move || {
                if ops.try_increment().is_ok() {
                    assert_eq!(fired.load(Ordering::SeqCst), 0);
                    ops.decrement();
                }
            })
        };

        ops.decrement();
        racer.join().unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(ops.is_completed());
    });
}

/// Two threads each run one paired operation against a held seed.
#[test]
fn test_two_racers_with_seed() {
    loom::model(|| {
        let (ops, fired) = counting();
        ops.increment();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ops = Arc::clone(&ops);
                thread::spawn(move || {
                    ops.increment();
                    ops.decrement();
                })
            })
            .collect();

        ops.decrement();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    });
}

/// Two concurrent final decrements of two operations.
#[test]
fn test_concurrent_final_decrements() {
    loom::model(|| {
        let (ops, fired) = counting();
        ops.increment();
        ops.increment();

        let other = {
            let ops = Arc::clone(&ops);
            thread::spawn(move || ops.decrement())
        };

        ops.decrement();
        other.join().unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(ops.outstanding(), 0);
    });
}

/// A stray decrement on a fresh counter racing a real pair still fires once.
#[test]
fn test_saturating_decrement_races_pair() {
    loom::model(|| {
        let (ops, fired) = counting();

        let pair = {
            let ops = Arc::clone(&ops);
            thread::spawn(move || {
                ops.increment();
                ops.decrement();
            })
        };

        ops.decrement();
        pair.join().unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    });
}
