//! Cycle records, contributions, and settlement receipts.

use serde::{Deserialize, Serialize};
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{PoolId, WalletAddress};
use time::OffsetDateTime;
use uuid::Uuid;

/// One recorded contribution within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionEntry {
    pub wallet: WalletAddress,
    /// Full amount transferred into escrow, late surcharge included.
    pub amount: TokenAmount,
    /// Portion of `amount` that was the late surcharge; zero when on time.
    pub late_fee: TokenAmount,
    pub paid_at: OffsetDateTime,
}

/// Proof that a cycle settled. Stored on the cycle so replaying the
/// settlement returns the identical result without a second transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub receipt_id: Uuid,
    pub pool_id: PoolId,
    pub cycle_index: u32,
    pub payee: WalletAddress,
    pub pot: TokenAmount,
    pub fee: TokenAmount,
    pub disbursed: TokenAmount,
    pub settled_at: OffsetDateTime,
}

/// The engine's record of one cycle.
///
/// The payee is resolved lazily at settlement and immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub pool_id: PoolId,
    pub cycle_index: u32,
    pub opened_at: OffsetDateTime,
    /// On-time contribution deadline.
    pub deadline: OffsetDateTime,
    /// Late contributions are accepted until this instant.
    pub grace_deadline: OffsetDateTime,
    pub payee: Option<WalletAddress>,
    /// Contributions in payment order.
    pub contributions: Vec<ContributionEntry>,
    pub pot: TokenAmount,
    /// Members marked as having missed this cycle, set at settlement.
    pub missed: Vec<WalletAddress>,
    pub settlement: Option<SettlementReceipt>,
}

impl CycleRecord {
    pub fn open(
        pool_id: PoolId,
        cycle_index: u32,
        opened_at: OffsetDateTime,
        cycle_duration: time::Duration,
        grace_period: time::Duration,
    ) -> Self {
        let deadline = opened_at + cycle_duration;
        Self {
            pool_id,
            cycle_index,
            opened_at,
            deadline,
            grace_deadline: deadline + grace_period,
            payee: None,
            contributions: Vec::new(),
            pot: TokenAmount::ZERO,
            missed: Vec::new(),
            settlement: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settlement.is_some()
    }

    pub fn contribution_of(&self, wallet: &WalletAddress) -> Option<&ContributionEntry> {
        self.contributions.iter().find(|c| &c.wallet == wallet)
    }

    pub fn has_contributed(&self, wallet: &WalletAddress) -> bool {
        self.contribution_of(wallet).is_some()
    }
}
