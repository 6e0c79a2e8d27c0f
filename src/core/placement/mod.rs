//! Placement strategies for choosing a free block
//!
//! Three classic policies over the ordered ledger:
//! - [`first_fit`] - first free block in address order that is large enough
//! - [`best_fit`] - smallest free block that is large enough
//! - [`worst_fit`] - largest free block that is large enough
//!
//! Best-fit and worst-fit only replace their incumbent on a strictly smaller
//! (resp. larger) block, so equal extremal sizes resolve to the lowest address.

pub mod best_fit;
pub mod first_fit;
pub mod worst_fit;

use crate::error::SimError;
use crate::ledger::Block;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use best_fit::BestFit;
pub use first_fit::FirstFit;
pub use worst_fit::WorstFit;

/// Placement policy trait
///
/// Selects the index of the block a request of `size` units should be carved
/// from, or `None` when no free block is large enough. Implementations never
/// mutate the ledger.
pub trait PlacementPolicy {
    /// Choose a block for `size` units
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize>;

    /// Strategy this policy implements
    fn strategy(&self) -> Strategy;
}

/// Free blocks able to hold `size` units, with their ledger index
pub(crate) fn candidates(blocks: &[Block], size: u64) -> impl Iterator<Item = (usize, &Block)> {
    blocks
        .iter()
        .enumerate()
        .filter(move |(_, block)| block.is_free() && block.size >= size)
}

/// Placement strategy
///
/// Parsing is case-insensitive and ignores spaces, hyphens and underscores,
/// so `"Best Fit"`, `"best-fit"`, `"BEST_FIT"` and `"bestfit"` are equivalent.
///
/// ```
/// use memplace::Strategy;
///
/// assert_eq!("Best Fit".parse::<Strategy>().unwrap(), Strategy::BestFit);
/// assert_eq!(Strategy::WorstFit.to_string(), "worst-fit");
/// assert!("next-fit".parse::<Strategy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "kebab-case")]
pub enum Strategy {
    FirstFit,
    BestFit,
    WorstFit,
}

impl Strategy {
    /// All strategies, in the advisor's tie-break preference order
    pub const ALL: [Strategy; 3] = [Strategy::FirstFit, Strategy::BestFit, Strategy::WorstFit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::FirstFit => "first-fit",
            Strategy::BestFit => "best-fit",
            Strategy::WorstFit => "worst-fit",
        }
    }

    /// Title-cased label used for display tags ("Best-Fit")
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::FirstFit => "First-Fit",
            Strategy::BestFit => "Best-Fit",
            Strategy::WorstFit => "Worst-Fit",
        }
    }

    /// Policy implementing this strategy
    pub fn policy(&self) -> &'static dyn PlacementPolicy {
        match self {
            Strategy::FirstFit => &FirstFit,
            Strategy::BestFit => &BestFit,
            Strategy::WorstFit => &WorstFit,
        }
    }

    /// Choose a block for `size` units with this strategy
    pub fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        self.policy().select(blocks, size)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "firstfit" => Ok(Strategy::FirstFit),
            "bestfit" => Ok(Strategy::BestFit),
            "worstfit" => Ok(Strategy::WorstFit),
            _ => Err(SimError::UnknownStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::validation::OwnerId;

    /// free(0-9) P1(10-29) free(30-59) P2(60-69) free(70-79) P3(80-89) free(90-99)
    fn fragmented() -> Ledger {
        Ledger::from_layout(
            100,
            &[
                (10, None),
                (20, Some("P1")),
                (30, None),
                (10, Some("P2")),
                (10, None),
                (10, Some("P3")),
                (10, None),
            ],
        )
    }

    #[test]
    fn test_parse_normalization() {
        for input in ["first-fit", "First Fit", "FIRST_FIT", "firstfit", " first - fit "] {
            assert_eq!(input.parse::<Strategy>().unwrap(), Strategy::FirstFit);
        }
        for input in ["best-fit", "Best Fit", "bestfit", "best_fit"] {
            assert_eq!(input.parse::<Strategy>().unwrap(), Strategy::BestFit);
        }
        for input in ["worst-fit", "Worst Fit", "WORSTFIT"] {
            assert_eq!(input.parse::<Strategy>().unwrap(), Strategy::WorstFit);
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = "next-fit".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, SimError::UnknownStrategy(s) if s == "next-fit"));
        assert!("".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_serde_accepts_loose_names() {
        let s: Strategy = serde_json::from_str("\"Worst Fit\"").unwrap();
        assert_eq!(s, Strategy::WorstFit);
        assert_eq!(serde_json::to_string(&Strategy::BestFit).unwrap(), "\"best-fit\"");
    }

    #[test]
    fn test_strategies_disagree_on_fragmented_ledger() {
        let ledger = fragmented();
        let blocks = ledger.blocks();

        assert_eq!(Strategy::FirstFit.select(blocks, 10), Some(0));
        assert_eq!(Strategy::BestFit.select(blocks, 10), Some(0));
        assert_eq!(Strategy::WorstFit.select(blocks, 10), Some(2));

        assert_eq!(Strategy::FirstFit.select(blocks, 15), Some(2));
        assert_eq!(Strategy::BestFit.select(blocks, 15), Some(2));
        assert_eq!(Strategy::WorstFit.select(blocks, 15), Some(2));
    }

    #[test]
    fn test_no_fit_for_every_strategy() {
        let ledger = fragmented();
        for strategy in Strategy::ALL {
            assert_eq!(strategy.select(ledger.blocks(), 31), None);
        }
    }

    #[test]
    fn test_selection_is_deterministic() {
        let ledger = fragmented();
        for strategy in Strategy::ALL {
            let first = strategy.select(ledger.blocks(), 5);
            for _ in 0..10 {
                assert_eq!(strategy.select(ledger.blocks(), 5), first);
            }
        }
    }

    #[test]
    fn test_policy_reports_strategy() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.policy().strategy(), strategy);
        }
    }

    #[test]
    fn test_owned_blocks_never_selected() {
        let owner = OwnerId::new("P1").unwrap();
        let ledger = Ledger::from_layout(50, &[(50, Some(owner.as_str()))]);
        for strategy in Strategy::ALL {
            assert_eq!(strategy.select(ledger.blocks(), 1), None);
        }
    }
}
