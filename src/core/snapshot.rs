//! Immutable point-in-time views of the ledger
//!
//! A [`LedgerSnapshot`] is what readers see. The simulator swaps in a fresh
//! one after each successful mutation, so readers never observe a ledger
//! halfway through a split or a coalesce.

use crate::ledger::{Block, Ledger};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Number of mutations applied before this snapshot was taken
    pub version: u64,
    pub capacity: u64,
    pub blocks: Vec<Block>,
}

impl LedgerSnapshot {
    pub fn capture(ledger: &Ledger, version: u64) -> Self {
        LedgerSnapshot {
            version,
            capacity: ledger.capacity(),
            blocks: ledger.view(),
        }
    }

    /// Human-readable ranges, e.g. `["[0-19] P1", "[20-99] Free"]`
    pub fn render(&self) -> Vec<String> {
        self.blocks.iter().map(Block::to_string).collect()
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats::from_blocks(self.capacity, &self.blocks)
    }
}

/// Usage summary of the address space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub capacity: u64,
    pub used: u64,
    pub free: u64,
    pub free_blocks: usize,
    pub owned_blocks: usize,
    pub largest_free: u64,
    /// `1 - largest_free / free`; 0.0 when nothing is free
    pub external_fragmentation: f64,
}

impl MemoryStats {
    pub fn from_blocks(capacity: u64, blocks: &[Block]) -> Self {
        let mut free = 0u64;
        let mut free_blocks = 0usize;
        let mut largest_free = 0u64;

        for block in blocks.iter().filter(|b| b.is_free()) {
            free += block.size;
            free_blocks += 1;
            largest_free = largest_free.max(block.size);
        }

        let external_fragmentation = if free == 0 {
            0.0
        } else {
            1.0 - (largest_free as f64 / free as f64)
        };

        MemoryStats {
            capacity,
            used: capacity - free,
            free,
            free_blocks,
            owned_blocks: blocks.len() - free_blocks,
            largest_free,
            external_fragmentation,
        }
    }

    /// Fraction of capacity currently owned
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.used as f64 / self.capacity as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pristine_stats() {
        let snapshot = LedgerSnapshot::capture(&Ledger::new(100), 0);
        let stats = snapshot.stats();

        assert_eq!(stats.used, 0);
        assert_eq!(stats.free, 100);
        assert_eq!(stats.free_blocks, 1);
        assert_eq!(stats.largest_free, 100);
        assert_eq!(stats.external_fragmentation, 0.0);
        assert_eq!(stats.utilization(), 0.0);
    }

    #[test]
    fn test_fragmented_stats() {
        let ledger = Ledger::from_layout(100, &[(20, None), (30, Some("P2")), (50, None)]);
        let stats = LedgerSnapshot::capture(&ledger, 3).stats();

        assert_eq!(stats.used, 30);
        assert_eq!(stats.free, 70);
        assert_eq!(stats.free_blocks, 2);
        assert_eq!(stats.owned_blocks, 1);
        assert_eq!(stats.largest_free, 50);
        assert!((stats.external_fragmentation - (1.0 - 50.0 / 70.0)).abs() < 1e-9);
        assert!((stats.utilization() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_full_ledger_has_no_fragmentation() {
        let ledger = Ledger::from_layout(10, &[(10, Some("P1"))]);
        let stats = LedgerSnapshot::capture(&ledger, 1).stats();
        assert_eq!(stats.free, 0);
        assert_eq!(stats.external_fragmentation, 0.0);
    }

    #[test]
    fn test_render_matches_ledger() {
        let ledger = Ledger::from_layout(100, &[(20, Some("P1")), (80, None)]);
        let snapshot = LedgerSnapshot::capture(&ledger, 1);
        assert_eq!(snapshot.render(), ledger.render());
        assert_eq!(snapshot.render(), vec!["[0-19] P1", "[20-99] Free"]);
    }

    #[test]
    fn test_capture_of_cleared_ledger() {
        let mut ledger = Ledger::new(64);
        ledger.clear();
        let snapshot = LedgerSnapshot::capture(&ledger, 7);
        assert_eq!(snapshot.render(), vec!["[0-63] Free"]);
        assert_eq!(snapshot.version, 7);
    }
}
