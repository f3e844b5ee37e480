//! Identifier newtypes shared by the engine and the wire APIs.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential pool identifier, assigned by the engine starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PoolId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(PoolId)
    }
}

/// Opaque wallet identity. The engine only compares wallets for equality;
/// it never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(pub CompactString);

impl WalletAddress {
    pub fn new(address: impl Into<CompactString>) -> Self {
        WalletAddress(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(CompactString::from(value))
    }
}

/// Opaque reference to the token a pool settles in. Passed through to the
/// ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRef(pub CompactString);

impl TokenRef {
    pub fn new(token: impl Into<CompactString>) -> Self {
        TokenRef(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenRef {
    fn from(value: &str) -> Self {
        TokenRef(CompactString::from(value))
    }
}

/// Hub directory slug (e.g. `"accra-traders"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubId(pub CompactString);

impl HubId {
    pub fn new(id: impl Into<CompactString>) -> Self {
        HubId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HubId {
    fn from(value: &str) -> Self {
        HubId(CompactString::from(value))
    }
}
