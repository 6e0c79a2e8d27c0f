//! Simulator configuration loaded from TOML or built programmatically
//!
//! ```toml
//! capacity = 256
//! default_strategy = "best-fit"
//! event_buffer = 128
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use crate::error::{Result, SimError};
use crate::placement::Strategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Capacity used when none is configured
pub const DEFAULT_CAPACITY: u64 = 100;

/// Per-subscriber event queue depth used when none is configured
pub const DEFAULT_EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimConfig {
    /// Size of the simulated address space in units
    #[validate(range(min = 1))]
    pub capacity: u64,

    /// Strategy used when a command does not name one
    pub default_strategy: Strategy,

    /// Events buffered per subscriber before new ones are dropped for it
    #[validate(range(min = 1))]
    pub event_buffer: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            capacity: DEFAULT_CAPACITY,
            default_strategy: Strategy::FirstFit,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl SimConfig {
    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SimError::Config(format!("TOML serialise error: {}", e)))
    }

    /// Run field validation, mapping failures into [`SimError::Config`]
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| SimError::Config(e.to_string()))
    }
}
