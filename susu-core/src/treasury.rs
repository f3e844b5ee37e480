//! Treasury fee accounting.
//!
//! Settlement reports each protocol fee here as an accrual entry. The
//! treasury is pure accounting: the fee tokens themselves remain in the
//! pool's escrow account, and collecting them is outside the engine's
//! scope. Nothing in here ever touches pool or member state.

use std::collections::HashMap;
use std::sync::Arc;
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{PoolId, TokenRef};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One fee accrual, recorded at settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasuryEntry {
    pub entry_id: Uuid,
    pub pool_id: PoolId,
    pub cycle_index: u32,
    pub token: TokenRef,
    pub amount: TokenAmount,
    pub recorded_at: OffsetDateTime,
}

/// Accrued fee balance for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasuryBalance {
    pub token: TokenRef,
    pub accrued: TokenAmount,
}

#[derive(Default)]
struct TreasuryState {
    accrued: HashMap<TokenRef, TokenAmount>,
    entries: Vec<TreasuryEntry>,
}

/// Token-keyed fee accrual ledger.
#[derive(Clone, Default)]
pub struct TreasuryLedger {
    state: Arc<Mutex<TreasuryState>>,
}

impl TreasuryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fee accrual. Zero-amount fees are recorded too, so every
    /// settled cycle has a treasury entry.
    pub async fn accrue(
        &self,
        pool_id: PoolId,
        cycle_index: u32,
        token: TokenRef,
        amount: TokenAmount,
        recorded_at: OffsetDateTime,
    ) -> TreasuryEntry {
        let entry = TreasuryEntry {
            entry_id: Uuid::now_v7(),
            pool_id,
            cycle_index,
            token: token.clone(),
            amount,
            recorded_at,
        };
        let mut state = self.state.lock().await;
        let balance = state.accrued.entry(token).or_insert(TokenAmount::ZERO);
        *balance = balance.saturating_add(amount);
        state.entries.push(entry.clone());
        entry
    }

    /// Accrued balance for one token.
    pub async fn balance(&self, token: &TokenRef) -> TokenAmount {
        self.state
            .lock()
            .await
            .accrued
            .get(token)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// All per-token balances, sorted by token for stable output.
    pub async fn balances(&self) -> Vec<TreasuryBalance> {
        let state = self.state.lock().await;
        let mut balances: Vec<TreasuryBalance> = state
            .accrued
            .iter()
            .map(|(token, accrued)| TreasuryBalance {
                token: token.clone(),
                accrued: *accrued,
            })
            .collect();
        balances.sort_by(|a, b| a.token.as_str().cmp(b.token.as_str()));
        balances
    }

    /// Every accrual entry, in recording order.
    pub async fn entries(&self) -> Vec<TreasuryEntry> {
        self.state.lock().await.entries.clone()
    }
}
