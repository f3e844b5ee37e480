//! Pool request and response types for the operator and public APIs.

use serde::{Deserialize, Serialize};

use super::ids::{PoolId, TokenRef, WalletAddress};
use crate::amounts::TokenAmount;
use crate::signature::Signature;

/// Pool lifecycle status as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    Created,
    Open,
    Active,
    Completed,
    Dissolved,
}

/// How the payout order is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Payouts follow the join order.
    Fixed,
    /// Payout order is a seed-derived permutation fixed at activation.
    Randomized,
}

/// Who may join a pool while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    /// Anyone may join until the pool is full.
    OpenJoin,
    /// Only wallets invited by the creator may join.
    Invite,
}

/// Request body for `POST /pools` — create a new pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePoolRequest {
    pub creator: WalletAddress,
    pub token: TokenRef,
    /// Number of members the pool runs with (2–50).
    pub capacity: u32,
    /// Fixed per-cycle contribution in token base units.
    pub contribution_amount: TokenAmount,
    pub cycle_duration_secs: u64,
    /// Late-contribution window after each cycle deadline. Engine default
    /// applies when omitted.
    #[serde(default)]
    pub grace_period_secs: Option<u64>,
    /// Unix timestamp the pool is scheduled to start at.
    pub starts_at: i64,
    pub rotation_mode: RotationMode,
    pub admission_mode: AdmissionMode,
    /// Protocol fee in basis points, deducted from each payout.
    pub fee_bps: u16,
    /// Surcharge applied to contributions made within the grace window.
    /// Engine default applies when omitted.
    #[serde(default)]
    pub late_fee_bps: Option<u16>,
}

impl Signature for CreatePoolRequest {}

/// Request body for `POST /pools/activate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatePoolRequest {
    pub pool_id: PoolId,
}

impl Signature for ActivatePoolRequest {}

/// Request body for `POST /pools/dissolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DissolvePoolRequest {
    pub pool_id: PoolId,
    /// Wallet requesting dissolution. Only the creator may dissolve an open
    /// pool; omitted for engine-forced retries.
    #[serde(default)]
    pub initiator: Option<WalletAddress>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Signature for DissolvePoolRequest {}

/// A pool as returned by the read APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolResponse {
    pub pool_id: PoolId,
    pub creator: WalletAddress,
    pub token: TokenRef,
    pub capacity: u32,
    pub member_count: u32,
    pub contribution_amount: TokenAmount,
    pub cycle_duration_secs: u64,
    pub grace_period_secs: u64,
    pub starts_at: i64,
    pub rotation_mode: RotationMode,
    pub admission_mode: AdmissionMode,
    pub fee_bps: u16,
    pub late_fee_bps: u16,
    pub status: PoolStatus,
    pub current_cycle: u32,
    pub total_contributed: TokenAmount,
    pub total_disbursed: TokenAmount,
    pub total_fees_accrued: TokenAmount,
    pub created_at: i64,
    pub activated_at: Option<i64>,
    pub dissolution_reason: Option<String>,
}

/// Response for `POST /pools/activate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationResponse {
    pub pool: PoolResponse,
    /// Full payout order fixed at activation, first payee first.
    pub payout_order: Vec<WalletAddress>,
    /// Base64 seed the randomized order was derived from, for audit.
    pub seed_base64: Option<String>,
}

/// One refund leg issued during dissolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResponse {
    pub wallet: WalletAddress,
    pub amount: TokenAmount,
    /// `false` when the ledger transfer failed; re-invoking dissolve retries it.
    pub completed: bool,
}

/// Response for `POST /pools/dissolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DissolutionResponse {
    pub pool: PoolResponse,
    pub refunds: Vec<RefundResponse>,
}

/// Payout order of an activated pool, with the audit seed when randomized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutOrderResponse {
    pub pool_id: PoolId,
    pub payout_order: Vec<WalletAddress>,
    pub seed_base64: Option<String>,
    /// The next wallet in line to be paid; `None` once the run is over.
    pub next_payee: Option<WalletAddress>,
}

/// Projected payout under full participation, for frontends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedPayoutResponse {
    pub pool_id: PoolId,
    pub projected_pot: TokenAmount,
    pub fee: TokenAmount,
    pub net: TokenAmount,
}

/// Engine validation limits, exposed so frontends can validate before
/// submitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineLimitsResponse {
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub max_fee_bps: u16,
    pub max_late_fee_bps: u16,
    pub default_grace_period_secs: u64,
    pub missed_cycle_threshold: u32,
}
