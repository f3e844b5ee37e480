//! Contribution and settlement request/response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{PoolId, WalletAddress};
use crate::amounts::TokenAmount;
use crate::signature::Signature;

/// Request body for `POST /pools/contribute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributeRequest {
    pub pool_id: PoolId,
    /// Cycle the contribution targets; must be the pool's current cycle.
    pub cycle: u32,
    pub wallet: WalletAddress,
    /// Must equal the required amount exactly (contribution plus late fee
    /// when inside the grace window).
    pub amount: TokenAmount,
}

impl Signature for ContributeRequest {}

/// Request body for `POST /pools/settle`. Anyone may trigger settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleCycleRequest {
    pub pool_id: PoolId,
    pub cycle: u32,
}

impl Signature for SettleCycleRequest {}

/// One recorded contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionResponse {
    pub wallet: WalletAddress,
    pub amount: TokenAmount,
    /// Portion of `amount` that was the late surcharge; zero when on time.
    pub late_fee: TokenAmount,
    pub paid_at: i64,
}

/// Response for `POST /pools/contribute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRecordedResponse {
    pub pool_id: PoolId,
    pub cycle: u32,
    pub contribution: ContributionResponse,
    /// Pot accumulated so far this cycle.
    pub pot: TokenAmount,
    /// `true` once every active member has contributed, i.e. the cycle can
    /// be settled immediately.
    pub cycle_ready: bool,
}

/// Settlement receipt. Replaying a settled cycle returns the identical
/// receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResponse {
    pub receipt_id: Uuid,
    pub pool_id: PoolId,
    pub cycle_index: u32,
    pub payee: WalletAddress,
    pub pot: TokenAmount,
    pub fee: TokenAmount,
    pub disbursed: TokenAmount,
    pub settled_at: i64,
}

/// A cycle as returned by the read APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleResponse {
    pub pool_id: PoolId,
    pub cycle_index: u32,
    pub opened_at: i64,
    pub deadline: i64,
    pub grace_deadline: i64,
    /// Resolved at settlement; `None` while the cycle is open.
    pub payee: Option<WalletAddress>,
    pub pot: TokenAmount,
    pub contributions: Vec<ContributionResponse>,
    /// Members marked as having missed this cycle.
    pub missed: Vec<WalletAddress>,
    pub settlement: Option<SettlementResponse>,
}
