/*!
 * Work Crew End-to-End Tests
 */

use crewsync::core::sync::{Backend, Posix, Win32};
use crewsync::crew::{
    Crew, CrewConfig, DrainPolicy, FixedWorkload, SyntheticWorkload, WorkItem, WorkerState,
};
use crewsync::SyncError;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn config(size: usize) -> CrewConfig {
    CrewConfig::new(size).with_shutdown_grace(Duration::from_secs(5))
}

fn batch(items: usize, value: f64) -> Vec<WorkItem> {
    (0..items).map(|_| WorkItem::single(value)).collect()
}

fn four_by_ten<B: Backend>() {
    let crew = Crew::<B>::create_with_backend(config(4), FixedWorkload::new(0.0)).unwrap();

    let result = crew.start(batch(4, 10.0)).unwrap();
    assert_eq!(result, 40.0);

    let stats = crew.stats().unwrap();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.head, None);
    assert_eq!(stats.tail, None);
    assert_eq!(stats.items_processed, 4);

    let report = crew.shutdown(Duration::from_secs(5));
    assert_eq!(report.joined, 4);
    assert!(report.stragglers.is_empty());
    assert_eq!(report.total, 40.0);
}

fn empty_batch_returns_immediately<B: Backend>() {
    let crew = Crew::<B>::create_with_backend(config(2), FixedWorkload::default()).unwrap();
    assert_eq!(crew.start(Vec::new()).unwrap(), 0.0);

    // Workers are still available afterwards
    assert_eq!(crew.stats().unwrap().live_workers, 2);
    assert_eq!(crew.start(batch(3, 1.5)).unwrap(), 4.5);
}

fn persistent_crew_serves_many_batches<B: Backend>() {
    let crew = Crew::<B>::create_with_backend(
        config(3).with_drain(DrainPolicy::Persistent),
        FixedWorkload::new(1.0),
    )
    .unwrap();

    for round in 1..=5 {
        let result = crew.start(batch(round, 2.0)).unwrap();
        assert_eq!(result, round as f64 * 3.0);
    }

    let stats = crew.stats().unwrap();
    assert_eq!(stats.batches, 5);
    assert_eq!(stats.items_processed, 15);
    assert_eq!(stats.live_workers, 3);
}

#[test]
#[serial]
fn test_four_workers_four_items_posix() {
    four_by_ten::<Posix>();
}

#[test]
#[serial]
fn test_four_workers_four_items_win32() {
    four_by_ten::<Win32>();
}

#[test]
#[serial]
fn test_empty_batch_posix() {
    empty_batch_returns_immediately::<Posix>();
}

#[test]
#[serial]
fn test_empty_batch_win32() {
    empty_batch_returns_immediately::<Win32>();
}

#[test]
#[serial]
fn test_persistent_crew_posix() {
    persistent_crew_serves_many_batches::<Posix>();
}

#[test]
#[serial]
fn test_persistent_crew_win32() {
    persistent_crew_serves_many_batches::<Win32>();
}

#[test]
#[serial]
fn test_synthetic_workload_result() {
    let crew = Crew::create(config(4), SyntheticWorkload::new(10_000)).unwrap();
    let result = crew.start(batch(4, 10.0)).unwrap();
    assert!((result - 40.0).abs() < 1e-6, "result = {result}");
}

#[test]
#[serial]
fn test_batch_timeout_rolls_back() {
    let release = Arc::new(AtomicBool::new(false));
    let gate = release.clone();
    let slow = move |item: &WorkItem| {
        while !gate.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        item.sum()
    };

    let crew = Crew::create(
        config(1)
            .with_drain(DrainPolicy::Persistent)
            .with_batch_timeout(Duration::from_millis(50)),
        slow,
    )
    .unwrap();

    // One item in flight, two still queued when the deadline passes
    assert_eq!(crew.start(batch(3, 1.0)), Err(SyncError::Timeout));

    let stats = crew.stats().unwrap();
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.head, None);
    assert_eq!(stats.tail, None);
    assert!(stats.pending <= 1);

    release.store(true, Ordering::SeqCst);
    assert_eq!(crew.start(batch(2, 1.0)).unwrap(), 2.0);
    assert_eq!(crew.stats().unwrap().pending, 0);
}

#[test]
#[serial]
fn test_exit_on_drain_eventually_reports_no_workers() {
    let crew = Crew::create(config(1), FixedWorkload::default()).unwrap();
    assert_eq!(crew.start(batch(1, 5.0)).unwrap(), 5.0);

    // The only worker left after draining
    while crew.stats().unwrap().live_workers > 0 {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(crew.worker_states(), vec![WorkerState::Finished]);
    assert_eq!(crew.start(batch(1, 5.0)), Err(SyncError::NoWorkers));

    // A rejected batch is not counted
    assert_eq!(crew.stats().unwrap().batches, 1);
}

#[test]
#[serial]
fn test_shutdown_reports_stragglers() {
    let stuck = Arc::new(AtomicBool::new(true));
    let gate = stuck.clone();
    let blocking = move |item: &WorkItem| {
        while gate.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        item.sum()
    };

    let crew = Crew::create(
        config(1).with_batch_timeout(Duration::from_millis(20)),
        blocking,
    )
    .unwrap();
    assert_eq!(crew.start(batch(1, 1.0)), Err(SyncError::Timeout));

    let report = crew.shutdown(Duration::from_millis(50));
    assert_eq!(report.joined, 0);
    assert_eq!(report.stragglers, vec!["crew-worker-0".to_string()]);

    // Let the detached worker finish
    stuck.store(false, Ordering::SeqCst);
}
