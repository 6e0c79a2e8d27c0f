//! Concurrent access through cloned simulator handles

use memplace::{ChangeKind, Simulator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_parallel_writers_keep_ledger_consistent() {
    let sim = Simulator::new(10_000);

    let handles: Vec<_> = (0..8)
        .map(|thread_id| {
            let sim = sim.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    let owner = format!("T{}-{}", thread_id, i);
                    sim.allocate(&owner, 7, "best-fit").unwrap();
                    if i % 2 == 0 {
                        sim.deallocate(&owner).unwrap();
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = sim.stats();
    assert_eq!(stats.used, 8 * 25 * 7);
    assert_eq!(stats.owned_blocks, 8 * 25);
    assert_eq!(sim.snapshot().version, 8 * 75);
    assert_eq!(sim.history().len(), 8 * 75);
}

#[test]
fn test_readers_never_see_torn_ledger() {
    let sim = Simulator::new(1_000);
    let reads = Arc::new(AtomicUsize::new(0));

    let writer = {
        let sim = sim.clone();
        std::thread::spawn(move || {
            for i in 0..200 {
                let owner = format!("W{}", i % 10);
                if sim.allocate(&owner, 1 + (i % 40), "worst-fit").is_err() {
                    sim.deallocate(&owner).unwrap();
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let sim = sim.clone();
            let reads = reads.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = sim.snapshot();
                    let mut expected = 0;
                    for block in &snapshot.blocks {
                        assert_eq!(block.start, expected);
                        assert!(block.size > 0);
                        expected += block.size;
                    }
                    assert_eq!(expected, snapshot.capacity);
                    let _ = sim.suggest_strategy(5).unwrap();
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for h in readers {
        h.join().unwrap();
    }
    assert_eq!(reads.load(Ordering::Relaxed), 800);
}

#[test]
fn test_subscribers_see_versions_in_order() {
    let sim = Simulator::builder().event_buffer(512).build().unwrap();
    let events = sim.subscribe();

    let handles: Vec<_> = (0..4)
        .map(|thread_id| {
            let sim = sim.clone();
            std::thread::spawn(move || {
                for i in 0..10 {
                    let owner = format!("T{}-{}", thread_id, i);
                    sim.allocate(&owner, 1, "first-fit").unwrap();
                    sim.deallocate(&owner).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let changes: Vec<_> = events.try_iter().collect();
    assert_eq!(changes.len(), 80);
    for (index, change) in changes.iter().enumerate() {
        assert_eq!(change.version(), index as u64 + 1);
    }
    assert_eq!(
        changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Allocated)
            .count(),
        40
    );
}

#[test]
fn test_dropped_subscriber_does_not_block_writers() {
    let sim = Simulator::builder().event_buffer(1).build().unwrap();
    let slow = sim.subscribe();
    drop(sim.subscribe());

    for i in 0..20 {
        sim.allocate(&format!("P{}", i), 1, "first-fit").unwrap();
    }

    // Only the first change fit in the slow subscriber's queue
    assert_eq!(slow.try_iter().count(), 1);
    assert_eq!(sim.snapshot().version, 20);
}
