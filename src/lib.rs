//! # memplace - Placement Strategy Simulator
//!
//! `memplace` simulates dynamic allocation over a fixed-size linear address
//! space. It manages a logical address range, not physical memory:
//!
//! - **Block ledger** that always tiles `[0, capacity)` with free and owned blocks
//! - **Placement strategies**: first-fit, best-fit and worst-fit
//! - **Split on allocation, coalesce on release**
//! - **Strategy advisor** recommending the strategy with the least internal waste
//! - **Audit and history logs** (append-only, per-owner filtering, CSV export)
//! - **Change notifications** pushed to subscribers after every mutation
//!
//! ## Quick Start
//!
//! ```rust
//! use memplace::{Result, Simulator, Strategy};
//!
//! # fn main() -> Result<()> {
//! let sim = Simulator::new(100);
//!
//! let p1 = sim.allocate("P1", 20, "first-fit")?;
//! assert_eq!(p1.range.to_string(), "[0-19]");
//!
//! sim.allocate("P2", 30, "Best Fit")?;
//! sim.deallocate("P1")?;
//! assert_eq!(sim.memory(), vec!["[0-19] Free", "[20-49] P2", "[50-99] Free"]);
//!
//! assert_eq!(sim.suggest_strategy(10)?, Some(Strategy::FirstFit));
//! # Ok(())
//! # }
//! ```
//!
//! ## Builder
//!
//! ```rust
//! use memplace::{Simulator, Strategy};
//!
//! # fn main() -> memplace::Result<()> {
//! let sim = Simulator::builder()
//!     .capacity(256)
//!     .default_strategy(Strategy::WorstFit)
//!     .event_buffer(16)
//!     .build()?;
//!
//! let events = sim.subscribe();
//! sim.allocate_default("P1", 8)?;
//! assert_eq!(events.try_recv().unwrap().version(), 1);
//! # Ok(())
//! # }
//! ```

// Core implementation
pub mod core;
pub mod response;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use self::core::{
    address_space, advisor, audit, config, error, events, ledger, placement, snapshot, validation,
};

// Re-export core types that users need
pub use crate::core::{
    address_space::{AddressSpace, Allocation, Release},
    advisor::Candidate,
    audit::{Action, AllocationStatus, AuditEntry, HistoryEntry},
    config::SimConfig,
    error::{FailureReason, Result, SimError},
    events::{ChangeKind, StateChange},
    ledger::{AddressRange, Block, BlockState, Ledger, LedgerViolation, Owner},
    placement::{PlacementPolicy, Strategy},
    snapshot::{LedgerSnapshot, MemoryStats},
    validation::OwnerId,
};

use crate::core::address_space::validate_size;
use crate::core::events::ChangeBus;
use crossbeam::channel::Receiver;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

struct Shared {
    /// Ledger and logs; mutations hold the write guard to completion
    space: RwLock<AddressSpace>,
    /// Latest immutable ledger view, swapped after each mutation
    published: RwLock<Arc<LedgerSnapshot>>,
    bus: ChangeBus,
}

/// Thread-safe simulator handle
///
/// Wraps an [`AddressSpace`] behind a single-writer boundary:
/// - `allocate`, `deallocate` and `reset` run one at a time, to completion
/// - `snapshot`, `memory`, `stats` and `suggest_strategy` read the last
///   published [`LedgerSnapshot`] and never see a half-applied mutation
/// - `history` and `log_for` take a shared read guard
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct Simulator {
    inner: Arc<Shared>,
}

impl Simulator {
    /// Simulator over `capacity` units with default settings
    ///
    /// A zero capacity is raised to one unit; use [`Simulator::with_config`]
    /// to have it rejected instead.
    pub fn new(capacity: u64) -> Self {
        let config = SimConfig {
            capacity: capacity.max(1),
            ..SimConfig::default()
        };
        Self::from_space(AddressSpace::new(config))
    }

    /// Simulator from a validated configuration
    pub fn with_config(config: SimConfig) -> Result<Self> {
        config.check()?;
        Ok(Self::from_space(AddressSpace::new(config)))
    }

    pub fn builder() -> SimulatorBuilder {
        SimulatorBuilder::new()
    }

    fn from_space(space: AddressSpace) -> Self {
        info!(
            "Simulator ready: {} units, default strategy {}",
            space.config().capacity,
            space.config().default_strategy
        );
        let bus = ChangeBus::new(space.config().event_buffer);
        let published = Arc::new(space.snapshot());
        Simulator {
            inner: Arc::new(Shared {
                space: RwLock::new(space),
                published: RwLock::new(published),
                bus,
            }),
        }
    }

    /// Swap in a fresh snapshot and notify subscribers
    ///
    /// Called with the write guard still held so versions are published in order.
    fn publish(&self, space: &AddressSpace, kind: ChangeKind, owner_id: Option<OwnerId>) {
        let snapshot = Arc::new(space.snapshot());
        *self.inner.published.write() = Arc::clone(&snapshot);

        let delivered = self.inner.bus.publish(StateChange {
            kind,
            owner_id,
            snapshot,
        });
        debug!("Published {:?} to {} subscriber(s)", kind, delivered);
    }

    /// Allocate `size` units to `owner_id` with the named strategy
    pub fn allocate(&self, owner_id: &str, size: i64, strategy: &str) -> Result<Allocation> {
        let mut space = self.inner.space.write();
        let allocation = space.allocate(owner_id, size, strategy)?;
        self.publish(&space, ChangeKind::Allocated, Some(allocation.owner_id.clone()));
        Ok(allocation)
    }

    /// Allocate with the configured default strategy
    pub fn allocate_default(&self, owner_id: &str, size: i64) -> Result<Allocation> {
        let mut space = self.inner.space.write();
        let strategy = space.config().default_strategy;
        let allocation = space.allocate_with(owner_id, size, strategy)?;
        self.publish(&space, ChangeKind::Allocated, Some(allocation.owner_id.clone()));
        Ok(allocation)
    }

    /// Release everything `owner_id` holds
    pub fn deallocate(&self, owner_id: &str) -> Result<Release> {
        let mut space = self.inner.space.write();
        let release = space.deallocate(owner_id)?;
        self.publish(&space, ChangeKind::Deallocated, Some(release.owner_id.clone()));
        Ok(release)
    }

    /// Empty the ledger; logs are kept
    pub fn reset(&self) {
        let mut space = self.inner.space.write();
        space.reset();
        self.publish(&space, ChangeKind::Reset, None);
    }

    /// Last published ledger view
    pub fn snapshot(&self) -> Arc<LedgerSnapshot> {
        Arc::clone(&self.inner.published.read())
    }

    /// Ledger as `"[start-end] Free|owner"` strings
    pub fn memory(&self) -> Vec<String> {
        self.snapshot().render()
    }

    pub fn stats(&self) -> MemoryStats {
        self.snapshot().stats()
    }

    /// Strategy with the least internal waste for `size` units
    ///
    /// `Ok(None)` when no strategy can place the request.
    pub fn suggest_strategy(&self, size: i64) -> Result<Option<Strategy>> {
        let size = validate_size(size)?;
        Ok(advisor::suggest(&self.snapshot().blocks, size))
    }

    /// Per-strategy choice and waste for `size` units
    pub fn evaluate(&self, size: i64) -> Result<Vec<Candidate>> {
        let size = validate_size(size)?;
        Ok(advisor::evaluate(&self.snapshot().blocks, size))
    }

    /// History entries, most recent first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.space.read().history()
    }

    /// Audit entries for exactly `owner_id`, oldest first
    pub fn log_for(&self, owner_id: &str) -> Vec<AuditEntry> {
        self.inner.space.read().log_for(owner_id)
    }

    /// An owner's audit entries as CSV
    pub fn audit_csv(&self, owner_id: &str) -> String {
        self.inner.space.read().audit().to_csv(owner_id)
    }

    /// Receive a [`StateChange`] after every successful mutation
    pub fn subscribe(&self) -> Receiver<StateChange> {
        self.inner.bus.subscribe()
    }

    pub fn config(&self) -> SimConfig {
        self.inner.space.read().config().clone()
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("snapshot", &self.snapshot())
            .field("bus", &self.inner.bus)
            .finish()
    }
}

/// Builder for [`Simulator`] with custom configuration
///
/// ```rust
/// use memplace::{Simulator, Strategy};
///
/// let sim = Simulator::builder()
///     .capacity(64)
///     .default_strategy(Strategy::BestFit)
///     .build()
///     .unwrap();
/// assert_eq!(sim.memory(), vec!["[0-63] Free"]);
/// ```
pub struct SimulatorBuilder {
    config: SimConfig,
}

impl SimulatorBuilder {
    pub fn new() -> Self {
        SimulatorBuilder {
            config: SimConfig::default(),
        }
    }

    /// Start from an existing configuration (e.g. loaded from TOML)
    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capacity(mut self, capacity: u64) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn default_strategy(mut self, strategy: Strategy) -> Self {
        self.config.default_strategy = strategy;
        self
    }

    pub fn event_buffer(mut self, buffer: usize) -> Self {
        self.config.event_buffer = buffer;
        self
    }

    /// Validate the configuration and build the simulator
    pub fn build(self) -> Result<Simulator> {
        Simulator::with_config(self.config)
    }
}

impl Default for SimulatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
