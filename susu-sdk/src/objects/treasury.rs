//! Treasury accounting responses (admin API).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{PoolId, TokenRef};
use crate::amounts::TokenAmount;

/// Accrued protocol fees for one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryBalanceResponse {
    pub token: TokenRef,
    pub accrued: TokenAmount,
}

/// One fee accrual entry, recorded at settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryEntryResponse {
    pub entry_id: Uuid,
    pub pool_id: PoolId,
    pub cycle_index: u32,
    pub token: TokenRef,
    pub amount: TokenAmount,
    pub recorded_at: i64,
}

/// Response for `GET /api/v1/admin/treasury`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryResponse {
    pub balances: Vec<TreasuryBalanceResponse>,
    pub entries: Vec<TreasuryEntryResponse>,
}
