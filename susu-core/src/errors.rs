//! Engine error taxonomy.
//!
//! Every operation fails with a typed error from one of the area enums
//! below, wrapped in [`EngineError`]. A failed operation never leaves
//! partial state behind.

use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{HubId, PoolId, WalletAddress};
use thiserror::Error;
use time::OffsetDateTime;

use crate::entities::{MemberStatus, PoolStatus};
use crate::framework::LedgerError;

/// Pool configuration rejected before any state was created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("capacity {requested} outside allowed range {min}..={max}")]
    CapacityOutOfRange { requested: u32, min: u32, max: u32 },

    #[error("contribution amount must be greater than zero")]
    ContributionAmountZero,

    #[error("cycle duration must be positive")]
    CycleDurationNotPositive,

    #[error("fee {requested_bps} bps exceeds the cap of {max_bps} bps")]
    FeeAboveCap { requested_bps: u16, max_bps: u16 },

    #[error("late fee {requested_bps} bps exceeds the cap of {max_bps} bps")]
    LateFeeAboveCap { requested_bps: u16, max_bps: u16 },

    #[error("start time {starts_at} is not in the future")]
    StartTimeNotInFuture { starts_at: OffsetDateTime },
}

/// Joining a pool was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("pool is at capacity ({capacity} members)")]
    CapacityExceeded { capacity: u32 },

    #[error("wallet {wallet} is already a member")]
    AlreadyMember { wallet: WalletAddress },

    #[error("pool is not accepting members")]
    AdmissionClosed,

    #[error("wallet {wallet} has not been invited")]
    NotInvited { wallet: WalletAddress },
}

/// A contribution was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContributionError {
    #[error("wallet {wallet} is not a member of this pool")]
    NotAMember { wallet: WalletAddress },

    #[error("member {wallet} is {status:?} and cannot contribute")]
    MemberNotParticipating {
        wallet: WalletAddress,
        status: MemberStatus,
    },

    #[error("amount mismatch: expected {expected}, got {got}")]
    AmountMismatch {
        expected: TokenAmount,
        got: TokenAmount,
    },

    #[error("wallet {wallet} already contributed to cycle {cycle}")]
    DuplicateContribution { wallet: WalletAddress, cycle: u32 },

    #[error("cycle {cycle} is closed to contributions")]
    CycleClosed { cycle: u32 },

    #[error("cycle {requested} is not the current cycle ({current})")]
    NotCurrentCycle { requested: u32, current: u32 },
}

/// Settlement could not proceed. A settled cycle replayed through the
/// settle operation is a success, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("pool is not active")]
    PoolNotActive,

    #[error("cycle not ready: waiting on {waiting_on} contribution(s)")]
    CycleNotReady { waiting_on: u32 },

    #[error("no eligible payee remains; pool dissolved")]
    NoEligiblePayee,
}

/// Graduation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraduationError {
    #[error("pool {pool_id} is not completed")]
    PoolNotCompleted { pool_id: PoolId },

    #[error("member {wallet} is not eligible to graduate")]
    NotEligible { wallet: WalletAddress },

    #[error("wallet {wallet} already graduated from pool {pool_id} into hub {hub_id}")]
    AlreadyGraduated {
        wallet: WalletAddress,
        pool_id: PoolId,
        hub_id: HubId,
    },

    #[error("hub {hub_id} is not registered")]
    UnknownHub { hub_id: HubId },

    #[error("hub {hub_id} is inactive")]
    HubInactive { hub_id: HubId },
}

/// A lifecycle transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot move pool from {from:?} to {attempted:?}")]
    InvalidTransition {
        from: PoolStatus,
        attempted: PoolStatus,
    },

    #[error("pool has {members} of {capacity} members and cannot activate")]
    ActivationNotReady { members: u32, capacity: u32 },

    #[error("pool start time {starts_at} has not been reached")]
    StartTimeNotReached { starts_at: OffsetDateTime },

    #[error("activation window expired; pool dissolved")]
    ActivationExpired,

    #[error("wallet {wallet} is not the pool creator")]
    NotCreator { wallet: WalletAddress },

    #[error("wallet {wallet} is not a member of this pool")]
    NotAMember { wallet: WalletAddress },

    #[error("member {wallet} cannot exit in status {status:?}")]
    ExitRefused {
        wallet: WalletAddress,
        status: MemberStatus,
    },

    #[error("pool in status {status:?} cannot be dissolved by request")]
    DissolveRefused { status: PoolStatus },
}

/// Umbrella error for all engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown pool {0}")]
    UnknownPool(PoolId),

    #[error("pool {0} has no cycle {1}")]
    UnknownCycle(PoolId, u32),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Contribution(#[from] ContributionError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Graduation(#[from] GraduationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl EngineError {
    /// Stable machine-readable code, used by the HTTP surface.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnknownPool(_) => "unknown_pool",
            EngineError::UnknownCycle(_, _) => "unknown_cycle",
            EngineError::Validation(e) => match e {
                ValidationError::CapacityOutOfRange { .. } => "capacity_out_of_range",
                ValidationError::ContributionAmountZero => "contribution_amount_zero",
                ValidationError::CycleDurationNotPositive => "cycle_duration_not_positive",
                ValidationError::FeeAboveCap { .. } => "fee_above_cap",
                ValidationError::LateFeeAboveCap { .. } => "late_fee_above_cap",
                ValidationError::StartTimeNotInFuture { .. } => "start_time_not_in_future",
            },
            EngineError::Admission(e) => match e {
                AdmissionError::CapacityExceeded { .. } => "capacity_exceeded",
                AdmissionError::AlreadyMember { .. } => "already_member",
                AdmissionError::AdmissionClosed => "admission_closed",
                AdmissionError::NotInvited { .. } => "not_invited",
            },
            EngineError::Contribution(e) => match e {
                ContributionError::NotAMember { .. } => "not_a_member",
                ContributionError::MemberNotParticipating { .. } => "member_not_participating",
                ContributionError::AmountMismatch { .. } => "amount_mismatch",
                ContributionError::DuplicateContribution { .. } => "duplicate_contribution",
                ContributionError::CycleClosed { .. } => "cycle_closed",
                ContributionError::NotCurrentCycle { .. } => "not_current_cycle",
            },
            EngineError::Settlement(e) => match e {
                SettlementError::PoolNotActive => "pool_not_active",
                SettlementError::CycleNotReady { .. } => "cycle_not_ready",
                SettlementError::NoEligiblePayee => "no_eligible_payee",
            },
            EngineError::Graduation(e) => match e {
                GraduationError::PoolNotCompleted { .. } => "pool_not_completed",
                GraduationError::NotEligible { .. } => "not_eligible",
                GraduationError::AlreadyGraduated { .. } => "already_graduated",
                GraduationError::UnknownHub { .. } => "unknown_hub",
                GraduationError::HubInactive { .. } => "hub_inactive",
            },
            EngineError::Lifecycle(e) => match e {
                LifecycleError::InvalidTransition { .. } => "invalid_transition",
                LifecycleError::ActivationNotReady { .. } => "activation_not_ready",
                LifecycleError::StartTimeNotReached { .. } => "start_time_not_reached",
                LifecycleError::ActivationExpired => "activation_expired",
                LifecycleError::NotCreator { .. } => "not_creator",
                LifecycleError::NotAMember { .. } => "not_a_member",
                LifecycleError::ExitRefused { .. } => "exit_refused",
                LifecycleError::DissolveRefused { .. } => "dissolve_refused",
            },
            EngineError::Ledger(e) => match e {
                LedgerError::InsufficientFunds { .. } => "insufficient_funds",
                LedgerError::AccountFrozen { .. } => "account_frozen",
                LedgerError::Unavailable(_) => "ledger_unavailable",
            },
        }
    }
}
