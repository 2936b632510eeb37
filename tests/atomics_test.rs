/*!
 * Atomic Operation Set Tests
 *
 * Algebraic properties of the atomic cells under concurrency, on both backends
 */

use crewsync::core::sync::{AtomicCell, AtomicPointer, Backend, MemoryOrder, Posix, Win32};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[derive(Debug, Clone, Copy)]
enum Op {
    Increment,
    Decrement,
    Add(i32),
    Subtract(i32),
}

impl Op {
    fn delta(self) -> i64 {
        match self {
            Op::Increment => 1,
            Op::Decrement => -1,
            Op::Add(v) => v as i64,
            Op::Subtract(v) => -(v as i64),
        }
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Increment),
        Just(Op::Decrement),
        (-1000i32..1000).prop_map(Op::Add),
        (-1000i32..1000).prop_map(Op::Subtract),
    ]
}

fn order_strategy() -> impl Strategy<Value = MemoryOrder> {
    prop::sample::select(MemoryOrder::ALL.to_vec())
}

fn apply_concurrently<B: Backend>(per_thread: Vec<Vec<Op>>, order: MemoryOrder) -> i64 {
    let cell = Arc::new(AtomicCell::<i64, B>::with_backend(0));
    let handles: Vec<_> = per_thread
        .into_iter()
        .map(|ops| {
            let cell = cell.clone();
            thread::spawn(move || {
                for op in ops {
                    match op {
                        Op::Increment => {
                            cell.increment(order);
                        }
                        Op::Decrement => {
                            cell.decrement(order);
                        }
                        Op::Add(v) => {
                            cell.add(v as i64, order);
                        }
                        Op::Subtract(v) => {
                            cell.subtract(v as i64, order);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    cell.load(MemoryOrder::Full)
}

fn single_winner_per_transition<B: Backend>(racers: usize) {
    let cell = Arc::new(AtomicCell::<i32, B>::with_backend(0));
    let start = Arc::new(Barrier::new(racers));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..racers)
        .map(|id| {
            let (cell, start, winners) = (cell.clone(), start.clone(), winners.clone());
            thread::spawn(move || {
                start.wait();
                if cell.compare_exchange(id as i32 + 1, 0, MemoryOrder::Full) == 0 {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_ne!(cell.load(MemoryOrder::Full), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_no_lost_updates_posix(
        per_thread in prop::collection::vec(prop::collection::vec(op_strategy(), 0..200), 1..5),
        order in order_strategy(),
    ) {
        let expected: i64 = per_thread.iter().flatten().map(|op| op.delta()).sum();
        prop_assert_eq!(apply_concurrently::<Posix>(per_thread, order), expected);
    }

    #[test]
    fn prop_no_lost_updates_win32(
        per_thread in prop::collection::vec(prop::collection::vec(op_strategy(), 0..200), 1..5),
        order in order_strategy(),
    ) {
        let expected: i64 = per_thread.iter().flatten().map(|op| op.delta()).sum();
        prop_assert_eq!(apply_concurrently::<Win32>(per_thread, order), expected);
    }

    #[test]
    fn prop_compare_exchange_leaves_cell_on_mismatch(
        initial in any::<i32>(),
        expected in any::<i32>(),
        value in any::<i32>(),
        order in order_strategy(),
    ) {
        for observed in [
            {
                let cell = AtomicCell::<i32, Posix>::with_backend(initial);
                (cell.compare_exchange(value, expected, order), cell.load(order))
            },
            {
                let cell = AtomicCell::<i32, Win32>::with_backend(initial);
                (cell.compare_exchange(value, expected, order), cell.load(order))
            },
        ] {
            let (seen, after) = observed;
            prop_assert_eq!(seen, initial);
            if initial == expected {
                prop_assert_eq!(after, value);
            } else {
                prop_assert_eq!(after, initial);
            }
        }
    }

    #[test]
    fn prop_bitwise_ops_return_previous(
        initial in any::<i32>(),
        mask in any::<i32>(),
        order in order_strategy(),
    ) {
        let posix = AtomicCell::<i32, Posix>::with_backend(initial);
        let win32 = AtomicCell::<i32, Win32>::with_backend(initial);

        prop_assert_eq!(posix.and(mask, order), initial);
        prop_assert_eq!(win32.and(mask, order), initial);
        prop_assert_eq!(posix.load(order), initial & mask);
        prop_assert_eq!(win32.load(order), initial & mask);

        prop_assert_eq!(posix.or(mask, order), initial & mask);
        prop_assert_eq!(win32.xor(mask, order), initial & mask);
        prop_assert_eq!(posix.load(order), (initial & mask) | mask);
        prop_assert_eq!(win32.load(order), (initial & mask) ^ mask);
    }
}

#[test]
fn test_single_compare_exchange_winner_posix() {
    single_winner_per_transition::<Posix>(8);
}

#[test]
fn test_single_compare_exchange_winner_win32() {
    single_winner_per_transition::<Win32>(8);
}

#[test]
fn test_reference_count_reaches_zero_once() {
    let refs = Arc::new(AtomicCell::new(8i32));
    let zero_hits = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let (refs, zero_hits) = (refs.clone(), zero_hits.clone());
            thread::spawn(move || {
                if refs.decrement(MemoryOrder::Release) == 0 {
                    zero_hits.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(zero_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pointer_publication() {
    let slot: Arc<AtomicPointer<String>> = Arc::new(AtomicPointer::null());
    let published = Box::into_raw(Box::new("ready".to_string()));

    let reader = {
        let slot = slot.clone();
        thread::spawn(move || loop {
            let ptr = slot.load(MemoryOrder::Acquire);
            if !ptr.is_null() {
                // SAFETY: the writer published a fully built String and frees it after join
                return unsafe { (*ptr).clone() };
            }
            thread::yield_now();
        })
    };

    assert!(slot.exchange(published, MemoryOrder::Release).is_null());
    assert_eq!(reader.join().unwrap(), "ready");

    let taken = slot.exchange(std::ptr::null_mut(), MemoryOrder::Full);
    // SAFETY: `taken` came from Box::into_raw above and is no longer shared
    drop(unsafe { Box::from_raw(taken) });
}
