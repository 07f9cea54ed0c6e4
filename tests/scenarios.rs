//! End-to-end lifecycle scenarios for the outstanding-operations counter.

use outstanding_ops::{
    ConfigBuilder, OpsConfig, OutstandingOps, OutstandingOpsError, Phase, UnderflowPolicy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn counting(config: OpsConfig) -> (Arc<OutstandingOps>, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let ops = {
        let fired = Arc::clone(&fired);
        OutstandingOps::with_config(
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            },
            config,
        )
        .unwrap()
    };
    (Arc::new(ops), fired)
}

/// One increment, one decrement on a single thread.
#[test]
fn single_pair_completes_after_decrement() {
    let (ops, fired) = counting(OpsConfig::testing());

    ops.increment();
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    ops.decrement();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(ops.phase(), Phase::Completed);
}

/// Two overlapping operations complete only after the second decrement.
#[test]
fn overlapping_pairs_complete_after_last_decrement() {
    let (ops, fired) = counting(OpsConfig::testing());

    ops.increment();
    ops.increment();
    ops.decrement();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(ops.outstanding(), 1);

    ops.decrement();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

/// A decrement on a fresh counter reaches zero and completes it under the
/// default policy.
#[test]
fn decrement_on_fresh_counter_completes() {
    let (ops, fired) = counting(OpsConfig::default());

    ops.decrement();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(ops.is_completed());
}

/// An increment racing the zero crossing defers completion until its own
/// decrement. The racing thread holds its operation until the main thread
/// has observed that completion did not fire.
#[test]
fn racing_increment_defers_completion() {
    for _ in 0..200 {
        let (ops, fired) = counting(OpsConfig::testing());
        ops.increment();

        let start = Arc::new(Barrier::new(2));
        let registered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let racer = {
            let ops = Arc::clone(&ops);
            let fired = Arc::clone(&fired);
            let (start, registered, release) =
                (Arc::clone(&start), Arc::clone(&registered), Arc::clone(&release));
            thread::spawn(move || {
                start.wait();
                let accepted = ops.try_increment().is_ok();
                if accepted {
                    // While this operation is outstanding nothing may fire.
                    assert_eq!(fired.load(Ordering::SeqCst), 0);
                }
                registered.wait();
                release.wait();
                if accepted {
                    ops.decrement();
                }
                accepted
            })
        };

        start.wait();
        ops.decrement();
        registered.wait();

        let fired_before_release = fired.load(Ordering::SeqCst);
        release.wait();
        let accepted = racer.join().unwrap();

        if accepted {
            // The racer's increment may have landed either before or after our
            // decrement, but never after completion, so nothing fired yet.
            assert_eq!(fired_before_release, 0);
        } else {
            assert_eq!(fired_before_release, 1);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(ops.is_completed());
    }
}

/// Increments after completion have no observable effect.
#[test]
fn increments_after_completion_are_inert() {
    let (ops, fired) = counting(OpsConfig::testing());
    ops.increment();
    ops.decrement();

    for _ in 0..10 {
        ops.increment();
        assert_eq!(ops.outstanding(), 0);
        ops.decrement();
    }

    assert!(matches!(
        ops.try_increment(),
        Err(OutstandingOpsError::Completed)
    ));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(ops.stats().unwrap().rejected_increments, 11);
}

#[test]
fn ignore_policy_protects_outstanding_operations() {
    let config = ConfigBuilder::new()
        .name("ignore")
        .underflow(UnderflowPolicy::Ignore)
        .stats(true)
        .build()
        .unwrap();
    let (ops, fired) = counting(config);

    ops.increment();
    ops.decrement();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    let (ops, fired) = counting(OpsConfig::production());
    ops.decrement();
    ops.decrement();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(ops.stats().unwrap().underflows, 2);
}

#[test]
fn guards_and_manual_calls_mix() {
    let (ops, fired) = counting(OpsConfig::testing());

    let guard = ops.track();
    ops.increment();
    drop(guard);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    ops.decrement();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn completion_runs_on_the_decrementing_thread() {
    let runner = Arc::new(std::sync::Mutex::new(None));
    let ops = {
        let runner = Arc::clone(&runner);
        Arc::new(OutstandingOps::new(move || {
            *runner.lock().unwrap() = Some(thread::current().id());
        }))
    };

    ops.increment();
    let worker = {
        let ops = Arc::clone(&ops);
        thread::spawn(move || {
            ops.decrement();
            thread::current().id()
        })
    };
    let worker_id = worker.join().unwrap();

    assert_eq!(*runner.lock().unwrap(), Some(worker_id));
}

#[test]
fn development_preset_logs_and_counts() {
    let config = OpsConfig::development().with_name("dev-counter");
    let (ops, fired) = counting(config);

    ops.increment();
    ops.decrement();

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(ops.name(), Some("dev-counter"));
    assert_eq!(ops.underflow_policy(), UnderflowPolicy::Panic);
    assert_eq!(ops.stats().unwrap().completions, 1);
}
