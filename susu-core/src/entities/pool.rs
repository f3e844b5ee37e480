//! Pool records and the pool lifecycle state machine.

use serde::{Deserialize, Serialize};
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{PoolId, TokenRef, WalletAddress};
use susu_sdk::objects::pools::{
    AdmissionMode as SdkAdmissionMode, PoolStatus as SdkPoolStatus,
    RotationMode as SdkRotationMode,
};
use time::{Duration, OffsetDateTime};

/// Minimum number of members a pool may be configured for.
pub const MIN_CAPACITY: u32 = 2;
/// Maximum number of members a pool may be configured for.
pub const MAX_CAPACITY: u32 = 50;
/// Hard upper bound on the protocol fee (10%). Engine configuration may
/// lower this, never raise it.
pub const FEE_CAP_BPS: u16 = 1000;

/// Pool lifecycle status for engine state.
///
/// For API/DTO use, see `susu_sdk::objects::PoolStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    /// Under construction; never observable outside the engine.
    Created,
    /// Accepting members.
    Open,
    /// Running cycles.
    Active,
    /// All cycles settled. Terminal.
    Completed,
    /// Torn down before completion. Terminal.
    Dissolved,
}

impl PoolStatus {
    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// `Completed` and `Dissolved` are terminal.
    pub fn can_transition_to(self, next: PoolStatus) -> bool {
        matches!(
            (self, next),
            (PoolStatus::Created, PoolStatus::Open)
                | (PoolStatus::Open, PoolStatus::Active)
                | (PoolStatus::Open, PoolStatus::Dissolved)
                | (PoolStatus::Active, PoolStatus::Completed)
                | (PoolStatus::Active, PoolStatus::Dissolved)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PoolStatus::Completed | PoolStatus::Dissolved)
    }
}

impl From<PoolStatus> for SdkPoolStatus {
    fn from(value: PoolStatus) -> Self {
        match value {
            PoolStatus::Created => SdkPoolStatus::Created,
            PoolStatus::Open => SdkPoolStatus::Open,
            PoolStatus::Active => SdkPoolStatus::Active,
            PoolStatus::Completed => SdkPoolStatus::Completed,
            PoolStatus::Dissolved => SdkPoolStatus::Dissolved,
        }
    }
}

/// How the payout order is determined. Engine-side twin of the wire enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    Fixed,
    Randomized,
}

impl From<SdkRotationMode> for RotationMode {
    fn from(value: SdkRotationMode) -> Self {
        match value {
            SdkRotationMode::Fixed => RotationMode::Fixed,
            SdkRotationMode::Randomized => RotationMode::Randomized,
        }
    }
}

impl From<RotationMode> for SdkRotationMode {
    fn from(value: RotationMode) -> Self {
        match value {
            RotationMode::Fixed => SdkRotationMode::Fixed,
            RotationMode::Randomized => SdkRotationMode::Randomized,
        }
    }
}

/// Who may join a pool while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    OpenJoin,
    Invite,
}

impl From<SdkAdmissionMode> for AdmissionMode {
    fn from(value: SdkAdmissionMode) -> Self {
        match value {
            SdkAdmissionMode::OpenJoin => AdmissionMode::OpenJoin,
            SdkAdmissionMode::Invite => AdmissionMode::Invite,
        }
    }
}

impl From<AdmissionMode> for SdkAdmissionMode {
    fn from(value: AdmissionMode) -> Self {
        match value {
            AdmissionMode::OpenJoin => SdkAdmissionMode::OpenJoin,
            AdmissionMode::Invite => SdkAdmissionMode::Invite,
        }
    }
}

/// Why a pool ended up dissolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DissolutionReason {
    /// The creator cancelled the pool while it was still open.
    CreatorCancelled { reason: Option<String> },
    /// Settlement could not resolve a payee for a remaining cycle.
    NoEligiblePayee,
    /// The pool never filled and its activation window expired.
    ActivationExpired,
}

impl std::fmt::Display for DissolutionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DissolutionReason::CreatorCancelled { reason: Some(r) } => {
                write!(f, "cancelled by creator: {r}")
            }
            DissolutionReason::CreatorCancelled { reason: None } => {
                write!(f, "cancelled by creator")
            }
            DissolutionReason::NoEligiblePayee => write!(f, "no eligible payee"),
            DissolutionReason::ActivationExpired => write!(f, "activation window expired"),
        }
    }
}

/// The engine's record of one pool.
///
/// Capacity, contribution amount, and schedule are immutable once the pool
/// is open. `current_cycle` only moves forward and never exceeds `capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub pool_id: PoolId,
    pub creator: WalletAddress,
    pub token: TokenRef,
    pub capacity: u32,
    pub contribution_amount: TokenAmount,
    pub cycle_duration: Duration,
    pub grace_period: Duration,
    pub starts_at: OffsetDateTime,
    pub rotation_mode: RotationMode,
    pub admission_mode: AdmissionMode,
    pub fee_bps: u16,
    pub late_fee_bps: u16,
    pub status: PoolStatus,
    /// Index of the next cycle to settle; equal to the number of settled
    /// cycles.
    pub current_cycle: u32,
    pub total_contributed: TokenAmount,
    pub total_disbursed: TokenAmount,
    pub total_fees_accrued: TokenAmount,
    pub created_at: OffsetDateTime,
    pub activated_at: Option<OffsetDateTime>,
    pub dissolution_reason: Option<DissolutionReason>,
}

impl PoolRecord {
    /// Total number of cycles the pool runs: one per seat.
    pub fn total_cycles(&self) -> u32 {
        self.capacity
    }
}
