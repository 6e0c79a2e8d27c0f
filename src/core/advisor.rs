//! Strategy advisor
//!
//! Runs every placement strategy against the current ledger without mutating
//! it and recommends the one that leaves the least internal waste
//! (`chosen.size - requested`) in the block it would pick.
//!
//! This is a heuristic: waste is measured only against each strategy's
//! immediate choice, not against an optimal packing of future requests.

use crate::ledger::{AddressRange, Block};
use crate::placement::Strategy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What one strategy would do with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub strategy: Strategy,
    /// Block the strategy would carve from, if any qualifies
    pub block: Option<AddressRange>,
    /// Units left over inside the chosen block
    pub waste: Option<u64>,
}

/// Evaluate every strategy for a request of `size` units
///
/// Candidates come back in [`Strategy::ALL`] order.
pub fn evaluate(blocks: &[Block], size: u64) -> Vec<Candidate> {
    Strategy::ALL
        .iter()
        .map(|&strategy| {
            let chosen = strategy.select(blocks, size).map(|index| &blocks[index]);
            Candidate {
                strategy,
                block: chosen.map(Block::range),
                waste: chosen.map(|block| block.size - size),
            }
        })
        .collect()
}

/// Recommend the strategy with the smallest waste for `size` units
///
/// Strategies without a candidate block are excluded; `None` means no
/// strategy can place the request. Ties go to the earlier strategy in
/// [`Strategy::ALL`] (first-fit, then best-fit, then worst-fit).
pub fn suggest(blocks: &[Block], size: u64) -> Option<Strategy> {
    let mut best: Option<(Strategy, u64)> = None;

    for candidate in evaluate(blocks, size) {
        let Some(waste) = candidate.waste else {
            continue;
        };
        if best.map_or(true, |(_, best_waste)| waste < best_waste) {
            best = Some((candidate.strategy, waste));
        }
    }

    debug!(
        "Advisor: size={} suggestion={:?}",
        size,
        best.map(|(strategy, waste)| (strategy.as_str(), waste))
    );

    best.map(|(strategy, _)| strategy)
}
