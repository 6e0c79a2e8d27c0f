//! Change notifications for ledger observers
//!
//! The core publishes a [`StateChange`] after every successful mutation.
//! Delivery is fire-and-forget: each subscriber owns a bounded queue, a full
//! queue loses that one event for that one subscriber, and subscribers whose
//! receiver has been dropped are pruned on the next publish.

use crate::snapshot::LedgerSnapshot;
use crate::validation::OwnerId;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Allocated,
    Deallocated,
    Reset,
}

/// A new ledger state became available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub kind: ChangeKind,
    /// Owner the command acted for (`None` for resets)
    pub owner_id: Option<OwnerId>,
    pub snapshot: Arc<LedgerSnapshot>,
}

impl StateChange {
    /// Version of the ledger this change produced
    pub fn version(&self) -> u64 {
        self.snapshot.version
    }
}

/// Fan-out of state changes to any number of subscribers
pub struct ChangeBus {
    subscribers: Mutex<Vec<Sender<StateChange>>>,
    buffer: usize,
}

impl ChangeBus {
    /// Create a bus whose subscribers each buffer up to `buffer` events
    pub fn new(buffer: usize) -> Self {
        ChangeBus {
            subscribers: Mutex::new(Vec::new()),
            buffer: buffer.max(1),
        }
    }

    pub fn subscribe(&self) -> Receiver<StateChange> {
        let (tx, rx) = channel::bounded(self.buffer);
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver `change` to every live subscriber
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, change: StateChange) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;

        subscribers.retain(|tx| match tx.try_send(change.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Subscriber queue full, dropping change v{}",
                    change.version()
                );
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Pruning disconnected subscriber");
                false
            }
        });

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscriber_count())
            .field("buffer", &self.buffer)
            .finish()
    }
}
