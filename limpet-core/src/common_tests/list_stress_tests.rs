//! Multi-threaded suites.
//!
//! Freeing stays out of any window where another thread could still reach the
//! affected nodes: drains run against quiesced producers, popped boxes are
//! dropped only after every consumer has stopped, and sweeps run from a
//! single thread. That is the same exclusivity proof the unsafe operations
//! demand of production callers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::data_structures::LockFreeList;

use super::list_core_tests::{backward_ids, forward_ids};
use super::Task;

/// Concurrent publication at both ends, then structural verification.
pub fn stress_concurrent_publication(num_threads: usize, per_thread: usize) {
    let list = Arc::new(LockFreeList::new());
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let id = (t * per_thread + i) as u64;
                    if t % 2 == 0 {
                        list.insert_head(Task { id }).unwrap();
                    } else {
                        list.insert_tail(Task { id }).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let total = num_threads * per_thread;
    assert_eq!(list.count_live(), total);

    let forward = forward_ids(&list);
    let mut backward = backward_ids(&list);
    backward.reverse();
    assert_eq!(forward, backward, "prev links did not converge");

    let mut seen = forward;
    seen.sort_unstable();
    let expected: Vec<u64> = (0..total as u64).collect();
    assert_eq!(seen, expected, "published nodes lost or duplicated");
}

/// Publish from many producers, quiesce, then drain from many consumers.
///
/// Popped boxes are collected and dropped only after every consumer has
/// joined, honoring the pop ownership contract.
pub fn stress_drain(num_producers: usize, per_producer: usize, num_consumers: usize) {
    let list = Arc::new(LockFreeList::new());

    let producers: Vec<_> = (0..num_producers)
        .map(|t| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for i in 0..per_producer {
                    let id = (t * per_producer + i) as u64;
                    list.insert_tail(Task { id }).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let consumers: Vec<_> = (0..num_consumers)
        .map(|_| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Some(node) = unsafe { list.pop_head() } {
                    taken.push(node);
                }
                taken
            })
        })
        .collect();

    let mut all = Vec::new();
    for consumer in consumers {
        all.extend(consumer.join().unwrap());
    }

    let total = num_producers * per_producer;
    assert_eq!(all.len(), total, "drained count mismatch");
    assert!(list.is_empty());
    assert!(list.tail().is_none());

    let mut ids: Vec<u64> = all.iter().map(|node| node.value().id).collect();
    ids.sort_unstable();
    let expected: Vec<u64> = (0..total as u64).collect();
    assert_eq!(ids, expected, "a node was popped twice or lost");
}

/// The work-queue shape: producers publish, a monitor live-iterates, a
/// cleaner marks a subset removed, and the main thread sweeps after
/// quiescing.
pub fn stress_monitor_cleaner() {
    const TASKS: u64 = 900;

    let list = Arc::new(LockFreeList::new());

    let producers: Vec<_> = (0..2)
        .map(|t| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for id in (t as u64 * TASKS / 2)..((t as u64 + 1) * TASKS / 2) {
                    list.insert_head(Task { id }).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let stop = Arc::new(AtomicBool::new(false));

    let monitor = {
        let list = Arc::clone(&list);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut observations = 0usize;
            loop {
                let live = list.count_live();
                assert!(live <= TASKS as usize);
                observations += 1;
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
            observations
        })
    };

    let cleaner = {
        let list = Arc::clone(&list);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            for node in list.iter_live() {
                if node.value().id % 3 == 0 {
                    node.mark_removed();
                }
            }
            stop.store(true, Ordering::Relaxed);
        })
    };

    cleaner.join().unwrap();
    assert!(monitor.join().unwrap() > 0);

    let marked = (0..TASKS).filter(|id| id % 3 == 0).count();
    let mut cleaned = 0usize;
    let freed = unsafe { list.sweep_with(|_| cleaned += 1) };

    assert_eq!(freed, marked);
    assert_eq!(cleaned, marked);
    assert_eq!(list.count_live(), TASKS as usize - marked);
    assert!(list.iter_live().all(|node| node.value().id % 3 != 0));

    let forward = forward_ids(&list);
    let mut backward = backward_ids(&list);
    backward.reverse();
    assert_eq!(forward, backward);
}

/// A sweep running on another thread honors held refcounts; a later sweep
/// reclaims the released nodes.
pub fn stress_sweep_respects_refcount() {
    let list = Arc::new(LockFreeList::new());
    for id in 0..100 {
        list.insert_tail(Task { id }).unwrap();
    }

    let mut held = Vec::new();
    for node in list.iter_live() {
        if node.value().id < 50 {
            node.mark_removed();
        }
        if node.value().id < 10 {
            node.ref_acquire();
            held.push(node);
        }
    }

    let sweeper = {
        let list = Arc::clone(&list);
        thread::spawn(move || unsafe { list.sweep() })
    };
    let freed = sweeper.join().unwrap();

    assert_eq!(freed, 40);
    assert_eq!(list.count_pending(), 10);
    assert_eq!(list.count_live(), 50);

    for node in &held {
        node.ref_release();
    }

    let freed = unsafe { list.sweep() };
    assert_eq!(freed, 10);
    assert_eq!(list.count_pending(), 0);
    assert_eq!(list.count_live(), 50);
    assert_eq!(forward_ids(&list).len(), 50);
}

/// Racing markers on the same nodes: the flag is monotone and the live count
/// lands exactly once per marked node.
pub fn stress_parallel_marking(num_threads: usize) {
    const TASKS: u64 = 200;

    let list = Arc::new(LockFreeList::new());
    for id in 0..TASKS {
        list.insert_tail(Task { id }).unwrap();
    }

    let barrier = Arc::new(Barrier::new(num_threads));
    let markers: Vec<_> = (0..num_threads)
        .map(|_| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for node in list.iter_live() {
                    if node.value().id % 2 == 0 {
                        node.mark_removed();
                    }
                }
            })
        })
        .collect();
    for marker in markers {
        marker.join().unwrap();
    }

    assert_eq!(list.count_live(), TASKS as usize / 2);
    assert!(list.iter_live().all(|node| node.value().id % 2 == 1));
    assert_eq!(forward_ids(&list).len(), TASKS as usize);

    let freed = unsafe { list.sweep() };
    assert_eq!(freed, TASKS as usize / 2);
    assert_eq!(forward_ids(&list).len(), TASKS as usize / 2);
}
