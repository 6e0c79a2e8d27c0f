//! Coarse command history with full ledger renderings

use crate::placement::Strategy;
use crate::validation::OwnerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutating command recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allocate,
    Deallocate,
}

/// One mutating command and the ledger it left behind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sequence: u64,
    pub action: Action,
    pub owner_id: OwnerId,
    /// Units allocated, or released in total
    pub size: u64,
    pub strategy: Strategy,
    pub timestamp: DateTime<Utc>,
    /// Ledger rendering right after the command, e.g. `"[0-19] P1"`
    pub snapshot: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        action: Action,
        owner_id: OwnerId,
        size: u64,
        strategy: Strategy,
        timestamp: DateTime<Utc>,
        snapshot: Vec<String>,
    ) -> &HistoryEntry {
        let sequence = self.entries.len() as u64;
        self.entries.push(HistoryEntry {
            sequence,
            action,
            owner_id,
            size,
            strategy,
            timestamp,
            snapshot,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Entries most-recent-first; storage order is untouched
    pub fn recent_first(&self) -> Vec<HistoryEntry> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_first_ordering() {
        let mut log = HistoryLog::new();
        let now = Utc::now();

        log.append(
            Action::Allocate,
            OwnerId::new("P1").unwrap(),
            20,
            Strategy::FirstFit,
            now,
            vec!["[0-19] P1".into(), "[20-99] Free".into()],
        );
        log.append(
            Action::Deallocate,
            OwnerId::new("P1").unwrap(),
            20,
            Strategy::FirstFit,
            now,
            vec!["[0-99] Free".into()],
        );

        let recent = log.recent_first();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, Action::Deallocate);
        assert_eq!(recent[0].sequence, 1);
        assert_eq!(recent[1].action, Action::Allocate);

        // Reading twice does not disturb storage order
        assert_eq!(log.recent_first(), recent);
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(
            serde_json::to_string(&Action::Deallocate).unwrap(),
            "\"deallocate\""
        );
    }
}
