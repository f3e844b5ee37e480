//! Exact token amount arithmetic.
//!
//! All amounts in the Susu APIs are integer base units of the pool's token
//! (e.g. wei for an 18-decimal token). They are serialized as decimal
//! strings because JSON numbers cannot carry the full `u128` range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exact token amount in base units.
///
/// Arithmetic is checked; overflow returns `None` rather than wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(pub u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn new(base_units: u128) -> Self {
        TokenAmount(base_units)
    }

    pub const fn base_units(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    /// Saturating addition, for running totals that must never wrap.
    pub fn saturating_add(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_add(other.0))
    }

    /// Multiply by a small scalar (e.g. a member count).
    pub fn checked_mul_u32(self, factor: u32) -> Option<TokenAmount> {
        self.0.checked_mul(u128::from(factor)).map(TokenAmount)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when parsing a [`TokenAmount`] from a string.
#[derive(Debug, thiserror::Error)]
#[error("invalid token amount: {0}")]
pub struct ParseAmountError(String);

impl FromStr for TokenAmount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(TokenAmount)
            .map_err(|_| ParseAmountError(s.to_owned()))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = compact_str::CompactString::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
