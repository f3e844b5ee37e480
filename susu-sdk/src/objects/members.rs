//! Membership request and response types.

use serde::{Deserialize, Serialize};

use super::ids::{PoolId, WalletAddress};
use crate::amounts::TokenAmount;
use crate::signature::Signature;

/// Member standing within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Admitted, waiting for the pool to activate.
    Pending,
    /// Participating in an active pool.
    Active,
    /// Completed a pool cleanly and was recorded in a hub.
    Graduated,
    /// Missed more cycles than the engine tolerates.
    Defaulted,
    /// Left the pool voluntarily.
    Exited,
}

/// Request body for `POST /pools/join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPoolRequest {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
}

impl Signature for JoinPoolRequest {}

/// Request body for `POST /pools/invite` — creator invites a wallet into an
/// invite-mode pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteMemberRequest {
    pub pool_id: PoolId,
    pub creator: WalletAddress,
    pub wallet: WalletAddress,
}

impl Signature for InviteMemberRequest {}

/// Request body for `POST /pools/exit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPoolRequest {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
}

impl Signature for ExitPoolRequest {}

/// A pool member as returned by the read APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
    /// Zero-based admission order, unique within the pool.
    pub join_sequence: u32,
    pub status: MemberStatus,
    pub joined_at: i64,
    pub cycles_contributed: u32,
    pub cycles_missed: u32,
    pub total_contributed: TokenAmount,
    pub total_received: TokenAmount,
    pub late_fees_paid: TokenAmount,
    pub has_received_payout: bool,
}

/// Pools a wallet belongs to, in pool-id order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPoolsResponse {
    pub wallet: WalletAddress,
    pub pool_ids: Vec<PoolId>,
}
