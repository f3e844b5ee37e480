//! Engine configuration.
//!
//! Validated limits and defaults applied to every pool the engine manages.
//! The server crate builds this from its TOML file; tests construct it
//! directly.

use thiserror::Error;
use time::Duration;

use crate::entities::FEE_CAP_BPS;

/// Validated engine limits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound accepted for a pool's protocol fee.
    pub max_fee_bps: u16,
    /// Upper bound accepted for a pool's late-contribution surcharge.
    pub max_late_fee_bps: u16,
    /// Grace window applied when a pool does not specify one.
    pub default_grace_period: Duration,
    /// Late-fee rate applied when a pool does not specify one.
    pub default_late_fee_bps: u16,
    /// A member defaults once their missed-cycle count exceeds this.
    pub missed_cycle_threshold: u32,
    /// How long after its scheduled start an underfull open pool may
    /// linger before activation attempts dissolve it instead.
    pub activation_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_fee_bps: FEE_CAP_BPS,
            max_late_fee_bps: 500,
            default_grace_period: Duration::days(1),
            default_late_fee_bps: 200,
            missed_cycle_threshold: 1,
            activation_grace: Duration::days(7),
        }
    }
}

/// Rejected engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineConfigError {
    #[error("max_fee_bps {0} exceeds the hard cap of {FEE_CAP_BPS} bps")]
    FeeAboveHardCap(u16),

    #[error("max_late_fee_bps {0} exceeds the hard cap of {FEE_CAP_BPS} bps")]
    LateFeeAboveHardCap(u16),

    #[error("default_late_fee_bps {0} exceeds max_late_fee_bps {1}")]
    DefaultLateFeeAboveMax(u16, u16),

    #[error("default grace period must not be negative")]
    NegativeGracePeriod,

    #[error("activation grace must not be negative")]
    NegativeActivationGrace,
}

impl EngineConfig {
    /// Validate the limits against the hard caps.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.max_fee_bps > FEE_CAP_BPS {
            return Err(EngineConfigError::FeeAboveHardCap(self.max_fee_bps));
        }
        if self.max_late_fee_bps > FEE_CAP_BPS {
            return Err(EngineConfigError::LateFeeAboveHardCap(self.max_late_fee_bps));
        }
        if self.default_late_fee_bps > self.max_late_fee_bps {
            return Err(EngineConfigError::DefaultLateFeeAboveMax(
                self.default_late_fee_bps,
                self.max_late_fee_bps,
            ));
        }
        if self.default_grace_period.is_negative() {
            return Err(EngineConfigError::NegativeGracePeriod);
        }
        if self.activation_grace.is_negative() {
            return Err(EngineConfigError::NegativeActivationGrace);
        }
        Ok(())
    }
}
