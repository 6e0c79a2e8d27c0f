use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid size: {0} (must be a positive integer)")]
    InvalidSize(i64),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("No suitable block found for {requested} units")]
    NoSuitableBlock { requested: u64 },

    #[error("Process {0} not found")]
    OwnerNotFound(String),

    #[error("Process {0} already holds a live block")]
    OwnerAlreadyActive(String),

    #[error("Invalid owner id: {0}")]
    InvalidOwnerId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SimError {
    /// Machine-readable code for expected command outcomes.
    ///
    /// Returns `None` for configuration and I/O errors, which commands never produce.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            SimError::InvalidSize(_) => Some(FailureReason::InvalidSize),
            SimError::UnknownStrategy(_) => Some(FailureReason::UnknownStrategy),
            SimError::NoSuitableBlock { .. } => Some(FailureReason::NoSuitableBlock),
            SimError::OwnerNotFound(_) => Some(FailureReason::OwnerNotFound),
            SimError::OwnerAlreadyActive(_) => Some(FailureReason::OwnerAlreadyActive),
            SimError::InvalidOwnerId(_) => Some(FailureReason::InvalidOwnerId),
            SimError::Config(_) | SimError::Io(_) | SimError::Toml(_) => None,
        }
    }

    /// Whether the command was rejected before the ledger was consulted
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SimError::InvalidSize(_) | SimError::UnknownStrategy(_) | SimError::InvalidOwnerId(_)
        )
    }
}

/// Failure codes a transport layer maps onto its own status convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidSize,
    UnknownStrategy,
    NoSuitableBlock,
    OwnerNotFound,
    OwnerAlreadyActive,
    InvalidOwnerId,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidSize => "invalid_size",
            FailureReason::UnknownStrategy => "unknown_strategy",
            FailureReason::NoSuitableBlock => "no_suitable_block",
            FailureReason::OwnerNotFound => "owner_not_found",
            FailureReason::OwnerAlreadyActive => "owner_already_active",
            FailureReason::InvalidOwnerId => "invalid_owner_id",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
