//! The simulated address space: ledger plus its audit projections
//!
//! [`AddressSpace`] is the single owned state object. Every command goes
//! through `&mut self` (or `&self` for reads), so callers that share it
//! across threads must wrap it in one lock; see [`crate::Simulator`].

use crate::advisor::{self, Candidate};
use crate::audit::{Action, AuditEntry, AuditLog, HistoryEntry, HistoryLog};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::ledger::{AddressRange, Block, Ledger, Owner};
use crate::placement::Strategy;
use crate::snapshot::LedgerSnapshot;
use crate::validation::OwnerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Successful allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub owner_id: OwnerId,
    pub range: AddressRange,
    pub size: u64,
    pub strategy: Strategy,
    pub timestamp: DateTime<Utc>,
}

/// Successful release of everything an owner held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub owner_id: OwnerId,
    /// Ranges handed back, in address order
    pub released: Vec<AddressRange>,
    /// Total units handed back
    pub size: u64,
    /// Ledger rendering after coalescing
    #[serde(rename = "memory_snapshot")]
    pub memory: Vec<String>,
}

/// Ledger, audit log and history behind one owner
#[derive(Debug, Clone)]
pub struct AddressSpace {
    config: SimConfig,
    ledger: Ledger,
    audit: AuditLog,
    history: HistoryLog,
    /// Count of successful mutations
    version: u64,
}

impl AddressSpace {
    pub fn new(config: SimConfig) -> Self {
        AddressSpace {
            ledger: Ledger::new(config.capacity),
            config,
            audit: AuditLog::new(),
            history: HistoryLog::new(),
            version: 0,
        }
    }

    /// Address space of `capacity` units with default settings
    pub fn with_capacity(capacity: u64) -> Self {
        Self::new(SimConfig {
            capacity,
            ..SimConfig::default()
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Allocate `size` units to `owner_id` using the named strategy
    ///
    /// Strategy names are matched loosely (`"Best Fit"`, `"best_fit"`, ...).
    pub fn allocate(&mut self, owner_id: &str, size: i64, strategy: &str) -> Result<Allocation> {
        let size = validate_size(size)?;
        let owner_id = OwnerId::new(owner_id)?;
        let strategy: Strategy = strategy.parse()?;
        self.place(owner_id, size, strategy)
    }

    /// Allocate with an already-parsed strategy
    pub fn allocate_with(
        &mut self,
        owner_id: &str,
        size: i64,
        strategy: Strategy,
    ) -> Result<Allocation> {
        let size = validate_size(size)?;
        let owner_id = OwnerId::new(owner_id)?;
        self.place(owner_id, size, strategy)
    }

    fn place(&mut self, owner_id: OwnerId, size: u64, strategy: Strategy) -> Result<Allocation> {
        if self.ledger.ensure_initialized() {
            debug!("Ledger reinitialized to {} free units", self.ledger.capacity());
        }

        if self.ledger.holds(owner_id.as_str()) {
            return Err(SimError::OwnerAlreadyActive(owner_id.into_string()));
        }

        let index = strategy.select(self.ledger.blocks(), size).ok_or_else(|| {
            debug!(
                "No {} placement for {} units requested by '{}'",
                strategy, size, owner_id
            );
            SimError::NoSuitableBlock { requested: size }
        })?;

        if self.ledger.blocks()[index].size > size {
            self.ledger.split_at(index, size);
        }

        let range = self
            .ledger
            .assign(index, Owner::new(owner_id.clone(), strategy))
            .range();
        debug_assert_eq!(self.ledger.check_invariants(true), Ok(()));

        let timestamp = Utc::now();
        self.audit.record(owner_id.clone(), range, strategy, timestamp);
        self.history.append(
            Action::Allocate,
            owner_id.clone(),
            size,
            strategy,
            timestamp,
            self.ledger.render(),
        );
        self.version += 1;

        info!(
            "Allocated {} units to '{}' at {} using {}",
            size, owner_id, range, strategy
        );

        Ok(Allocation {
            owner_id,
            range,
            size,
            strategy,
            timestamp,
        })
    }

    /// Release every block held by exactly `owner_id`, then coalesce
    pub fn deallocate(&mut self, owner_id: &str) -> Result<Release> {
        self.ledger.ensure_initialized();

        let released = self.ledger.release(owner_id);
        let Some(Owner {
            id: owner,
            strategy,
        }) = released.first().and_then(Block::owner).cloned()
        else {
            debug!("Deallocate for unknown owner '{}'", owner_id);
            return Err(SimError::OwnerNotFound(owner_id.to_string()));
        };

        self.audit.mark_deallocated(owner_id);
        let merges = self.ledger.coalesce();
        debug_assert_eq!(self.ledger.check_invariants(true), Ok(()));

        let size = released.iter().map(|block| block.size).sum();
        let memory = self.ledger.render();
        self.history.append(
            Action::Deallocate,
            owner.clone(),
            size,
            strategy,
            Utc::now(),
            memory.clone(),
        );
        self.version += 1;

        info!(
            "Released {} units from '{}' ({} block(s), {} merge(s))",
            size,
            owner,
            released.len(),
            merges
        );

        Ok(Release {
            owner_id: owner,
            released: released.iter().map(|block| block.range()).collect(),
            size,
            memory,
        })
    }

    /// Empty the ledger; the next mutating command reinitializes it
    ///
    /// Audit and history entries are kept.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.version += 1;
        info!("Ledger reset ({} units)", self.ledger.capacity());
    }

    /// Immutable point-in-time copy of the ledger
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.ledger, self.version)
    }

    /// Ledger as `"[start-end] Free|owner"` strings
    pub fn render(&self) -> Vec<String> {
        self.ledger.render()
    }

    /// Strategy with the least waste for `size` units, if any can place it
    pub fn suggest(&self, size: i64) -> Result<Option<Strategy>> {
        let size = validate_size(size)?;
        Ok(advisor::suggest(&self.ledger.view(), size))
    }

    /// Per-strategy choice and waste for `size` units
    pub fn evaluate(&self, size: i64) -> Result<Vec<Candidate>> {
        let size = validate_size(size)?;
        Ok(advisor::evaluate(&self.ledger.view(), size))
    }

    /// History entries, most recent first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.recent_first()
    }

    /// Audit entries for exactly `owner_id`, oldest first
    pub fn log_for(&self, owner_id: &str) -> Vec<AuditEntry> {
        self.audit.for_owner(owner_id)
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// Reject non-positive sizes before any ledger access
pub(crate) fn validate_size(size: i64) -> Result<u64> {
    if size <= 0 {
        return Err(SimError::InvalidSize(size));
    }
    Ok(size as u64)
}
