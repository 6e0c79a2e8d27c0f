//! Property-based tests for ledger invariants
//!
//! Uses proptest to drive random command sequences through an `AddressSpace`
//! and checks the tiling invariants after every step.

use memplace::{AddressSpace, SimConfig, Strategy as Fit};
use proptest::prelude::*;
use std::collections::HashMap;

const CAPACITY: u64 = 256;
const OWNERS: [&str; 6] = ["P1", "P2", "P3", "P4", "P5", "P6"];

#[derive(Debug, Clone)]
enum Op {
    Alloc {
        owner: usize,
        size: i64,
        strategy: Fit,
    },
    Free(usize),
    Reset,
}

fn fit() -> impl Strategy<Value = Fit> {
    prop_oneof![
        Just(Fit::FirstFit),
        Just(Fit::BestFit),
        Just(Fit::WorstFit),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..OWNERS.len(), -4i64..120, fit())
            .prop_map(|(owner, size, strategy)| Op::Alloc { owner, size, strategy }),
        4 => (0..OWNERS.len()).prop_map(Op::Free),
        1 => Just(Op::Reset),
    ]
}

fn space() -> AddressSpace {
    AddressSpace::new(SimConfig {
        capacity: CAPACITY,
        ..SimConfig::default()
    })
}

fn owned_units(space: &AddressSpace) -> u64 {
    space
        .ledger()
        .blocks()
        .iter()
        .filter(|b| !b.is_free())
        .map(|b| b.size)
        .sum()
}

proptest! {
    #[test]
    fn prop_ledger_tiles_after_every_command(ops in prop::collection::vec(op(), 1..80)) {
        let mut space = space();
        let mut live: HashMap<&str, u64> = HashMap::new();

        for op in ops {
            let before = space.render();
            match op {
                Op::Alloc { owner, size, strategy } => {
                    let owner = OWNERS[owner];
                    match space.allocate_with(owner, size, strategy) {
                        Ok(allocation) => {
                            prop_assert!(!live.contains_key(owner));
                            prop_assert_eq!(allocation.size as i64, size);
                            live.insert(owner, allocation.size);
                        }
                        Err(_) => {
                            prop_assert_eq!(space.render(), before);
                        }
                    }
                }
                Op::Free(owner) => {
                    let owner = OWNERS[owner];
                    match space.deallocate(owner) {
                        Ok(release) => {
                            prop_assert_eq!(live.remove(owner), Some(release.size));
                        }
                        Err(_) => {
                            prop_assert!(!live.contains_key(owner));
                            prop_assert_eq!(space.render(), before);
                        }
                    }
                }
                Op::Reset => {
                    space.reset();
                    live.clear();
                    prop_assert_eq!(space.render(), vec![format!("[0-{}] Free", CAPACITY - 1)]);
                }
            }

            prop_assert_eq!(space.ledger().check_invariants(true), Ok(()));
            prop_assert_eq!(owned_units(&space), live.values().sum::<u64>());
        }
    }

    #[test]
    fn prop_alloc_then_free_restores_ledger(
        setup in prop::collection::vec((1i64..60, fit()), 0..6),
        size in 1i64..100,
        pick in fit(),
    ) {
        let mut space = space();
        for (index, (size, strategy)) in setup.into_iter().enumerate() {
            let _ = space.allocate_with(&format!("S{}", index), size, strategy);
        }
        // Punch a hole so the ledger has more than one free block
        let _ = space.deallocate("S1");

        let before = space.render();
        if space.allocate_with("T", size, pick).is_ok() {
            space.deallocate("T").unwrap();
            prop_assert_eq!(space.render(), before);
        }
    }

    #[test]
    fn prop_suggestion_has_minimal_waste(
        setup in prop::collection::vec((1i64..50, fit()), 1..8),
        holes in prop::collection::vec(0usize..8, 0..4),
        size in 1i64..80,
    ) {
        let mut space = space();
        for (index, (size, strategy)) in setup.into_iter().enumerate() {
            let _ = space.allocate_with(&format!("S{}", index), size, strategy);
        }
        for hole in holes {
            let _ = space.deallocate(&format!("S{}", hole));
        }

        let candidates = space.evaluate(size).unwrap();
        match space.suggest(size).unwrap() {
            Some(suggested) => {
                let waste = candidates
                    .iter()
                    .find(|c| c.strategy == suggested)
                    .and_then(|c| c.waste)
                    .unwrap();
                for candidate in &candidates {
                    prop_assert!(candidate.waste.map_or(true, |w| w >= waste));
                }
            }
            None => prop_assert!(candidates.iter().all(|c| c.waste.is_none())),
        }
    }
}
