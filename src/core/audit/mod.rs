//! Audit logging for allocation activity
//!
//! Two append-only projections of the ledger:
//! - [`AuditLog`] - one entry per successful allocation, whose status flips
//!   to `deallocated` when the owner releases it
//! - [`HistoryLog`] - one entry per mutating command, with the full ledger
//!   rendering at that instant
//!
//! Neither log ever feeds back into ledger mutation, and entries are never
//! removed or reordered.

mod history;

pub use history::{Action, HistoryEntry, HistoryLog};

use crate::ledger::AddressRange;
use crate::placement::Strategy;
use crate::validation::OwnerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Active,
    Deallocated,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Active => "active",
            AllocationStatus::Deallocated => "deallocated",
        }
    }
}

/// Single allocation record
///
/// Everything but `status` is fixed once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the log (0-based, monotonically increasing)
    pub sequence: u64,
    pub owner_id: OwnerId,
    pub range: AddressRange,
    pub size: u64,
    pub timestamp: DateTime<Utc>,
    pub strategy: Strategy,
    pub status: AllocationStatus,
}

/// Append-only allocation audit trail
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful allocation as `active`
    pub fn record(
        &mut self,
        owner_id: OwnerId,
        range: AddressRange,
        strategy: Strategy,
        timestamp: DateTime<Utc>,
    ) -> &AuditEntry {
        let sequence = self.entries.len() as u64;
        self.entries.push(AuditEntry {
            sequence,
            owner_id,
            range,
            size: range.size(),
            timestamp,
            strategy,
            status: AllocationStatus::Active,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Flip the most recent active entry for `owner_id` to `deallocated`
    ///
    /// Returns the updated entry, or `None` if the owner has no active entry.
    pub fn mark_deallocated(&mut self, owner_id: &str) -> Option<&AuditEntry> {
        let entry = self.entries.iter_mut().rev().find(|entry| {
            entry.status == AllocationStatus::Active && entry.owner_id.as_str() == owner_id
        })?;
        entry.status = AllocationStatus::Deallocated;
        Some(entry)
    }

    /// Entries for exactly `owner_id`, oldest first
    pub fn for_owner(&self, owner_id: &str) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.owner_id.as_str() == owner_id)
            .cloned()
            .collect()
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export an owner's entries as CSV
    ///
    /// Columns: `timestamp,range,size,strategy,status`. None of the fields can
    /// contain a comma, so no quoting is needed.
    pub fn to_csv(&self, owner_id: &str) -> String {
        let mut csv = String::from("timestamp,range,size,strategy,status\n");
        for entry in self
            .entries
            .iter()
            .filter(|entry| entry.owner_id.as_str() == owner_id)
        {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                entry.timestamp.to_rfc3339(),
                entry.range,
                entry.size,
                entry.strategy,
                entry.status.as_str()
            ));
        }
        csv
    }
}
