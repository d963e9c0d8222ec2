//! Voter address type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The address that cast a vote, exactly as the registry reports it.
///
/// Addresses are opaque: no checksum validation or case folding is applied,
/// so two spellings of the same account are two distinct voters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterAddress(String);

impl VoterAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for VoterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VoterAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VoterAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
