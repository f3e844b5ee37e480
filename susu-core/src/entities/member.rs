//! Member records.

use serde::{Deserialize, Serialize};
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::members::MemberStatus as SdkMemberStatus;
use susu_sdk::objects::{PoolId, WalletAddress};
use time::OffsetDateTime;

/// Member standing within a pool.
///
/// For API/DTO use, see `susu_sdk::objects::MemberStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Pending,
    Active,
    Graduated,
    Defaulted,
    Exited,
}

impl MemberStatus {
    /// Whether the member can still contribute and receive payouts.
    pub fn is_participating(self) -> bool {
        matches!(self, MemberStatus::Pending | MemberStatus::Active)
    }
}

impl From<MemberStatus> for SdkMemberStatus {
    fn from(value: MemberStatus) -> Self {
        match value {
            MemberStatus::Pending => SdkMemberStatus::Pending,
            MemberStatus::Active => SdkMemberStatus::Active,
            MemberStatus::Graduated => SdkMemberStatus::Graduated,
            MemberStatus::Defaulted => SdkMemberStatus::Defaulted,
            MemberStatus::Exited => SdkMemberStatus::Exited,
        }
    }
}

/// The engine's record of one pool membership.
///
/// `join_sequence` is unique and strictly increasing within a pool and is
/// never reused, even after an exit while the pool was still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
    pub join_sequence: u32,
    pub status: MemberStatus,
    pub joined_at: OffsetDateTime,
    pub cycles_contributed: u32,
    pub cycles_missed: u32,
    pub total_contributed: TokenAmount,
    pub total_received: TokenAmount,
    pub late_fees_paid: TokenAmount,
    /// At most one payout per pool lifetime.
    pub has_received_payout: bool,
}

impl MemberRecord {
    pub fn new(
        pool_id: PoolId,
        wallet: WalletAddress,
        join_sequence: u32,
        joined_at: OffsetDateTime,
    ) -> Self {
        Self {
            pool_id,
            wallet,
            join_sequence,
            status: MemberStatus::Pending,
            joined_at,
            cycles_contributed: 0,
            cycles_missed: 0,
            total_contributed: TokenAmount::ZERO,
            total_received: TokenAmount::ZERO,
            late_fees_paid: TokenAmount::ZERO,
            has_received_payout: false,
        }
    }

    /// Eligible to be resolved as a cycle payee: still participating and
    /// not yet paid out.
    pub fn is_payee_eligible(&self) -> bool {
        self.status.is_participating() && !self.has_received_payout
    }
}
