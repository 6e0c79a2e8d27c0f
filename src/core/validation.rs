//! Validation for owner identifiers
//!
//! Owner ids are logical keys, not system handles. They appear verbatim in
//! ledger snapshots (`[0-19] P1`), so a few shapes are rejected up front.

use crate::error::{Result, SimError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static OWNER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(OwnerId::PATTERN).expect("owner id pattern is a valid regex")
});

/// Validated owner identifier
///
/// # Rules
/// - ASCII letters, digits, `_`, `.`, `:` and `-`
/// - Must not start with `.`, `:` or `-`
/// - Length: 1-64 characters
/// - `free` (any case) is reserved for unowned blocks
///
/// # Examples
///
/// ```
/// use memplace::OwnerId;
///
/// let owner = OwnerId::new("P1").unwrap();
/// assert_eq!(owner.as_str(), "P1");
///
/// assert!(OwnerId::new("").is_err());
/// assert!(OwnerId::new("Free").is_err());
/// assert!(OwnerId::new("P 1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    const PATTERN: &'static str = r"^[A-Za-z0-9_][A-Za-z0-9_.:-]*$";

    pub const MAX_LENGTH: usize = 64;

    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(OwnerId(id))
    }

    fn validate(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(SimError::InvalidOwnerId(
                "owner id cannot be empty".to_string(),
            ));
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(SimError::InvalidOwnerId(format!(
                "owner id too long (max {} characters)",
                Self::MAX_LENGTH
            )));
        }

        if !OWNER_PATTERN.is_match(id) {
            return Err(SimError::InvalidOwnerId(format!(
                "owner id '{}' may only contain letters, digits, '_', '.', ':' and '-'",
                id
            )));
        }

        if id.eq_ignore_ascii_case("free") {
            return Err(SimError::InvalidOwnerId(format!(
                "owner id '{}' is reserved",
                id
            )));
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self> {
        OwnerId::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

impl PartialEq<str> for OwnerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
