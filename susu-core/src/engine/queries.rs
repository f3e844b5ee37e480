//! Read-only queries. Each one clones a snapshot out of the pool lock;
//! none of them mutate anything.

use itertools::Itertools;
use kanau::processor::Processor;
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{HubId, PoolId, WalletAddress};

use super::SusuEngine;
use crate::entities::{CycleRecord, GraduationRecord, HubRecord, MemberRecord, PoolRecord};
use crate::errors::{EngineError, GraduationError, LifecycleError, SettlementError};
use crate::fees;
use crate::rotation;

/// A pool with its current member count.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub pool: PoolRecord,
    pub member_count: u32,
}

/// The payout order of an activated pool.
#[derive(Debug, Clone)]
pub struct PayoutOrderView {
    pub pool_id: PoolId,
    /// First payee first.
    pub wallets: Vec<WalletAddress>,
    /// Activation entropy for randomized pools.
    pub seed: Option<[u8; 32]>,
    /// Who the next settlement would pay, if anyone remains eligible.
    pub next_payee: Option<WalletAddress>,
}

/// Projected full-pot payout under current pool terms.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedPayout {
    pub projected_pot: TokenAmount,
    pub fee: TokenAmount,
    pub net: TokenAmount,
}

/// A hub with its graduate count.
#[derive(Debug, Clone)]
pub struct HubView {
    pub hub: HubRecord,
    pub graduate_count: u32,
}

// ---------------------------------------------------------------------------
// Pool queries
// ---------------------------------------------------------------------------

/// All pools, ordered by id.
#[derive(Debug, Clone, Copy)]
pub struct ListPools;

impl Processor<ListPools> for SusuEngine {
    type Output = Vec<PoolSnapshot>;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:ListPools")]
    async fn process(&self, _query: ListPools) -> Result<Vec<PoolSnapshot>, EngineError> {
        let handles: Vec<_> = {
            let pools = self.inner.pools.read().await;
            pools.values().cloned().collect()
        };
        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            let aggregate = handle.lock().await;
            snapshots.push(PoolSnapshot {
                pool: aggregate.pool.clone(),
                member_count: aggregate.member_count(),
            });
        }
        Ok(snapshots
            .into_iter()
            .sorted_by_key(|s| s.pool.pool_id)
            .collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetPool {
    pub pool_id: PoolId,
}

impl Processor<GetPool> for SusuEngine {
    type Output = PoolSnapshot;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:GetPool")]
    async fn process(&self, query: GetPool) -> Result<PoolSnapshot, EngineError> {
        let aggregate = self.aggregate(query.pool_id).await?;
        let aggregate = aggregate.lock().await;
        Ok(PoolSnapshot {
            pool: aggregate.pool.clone(),
            member_count: aggregate.member_count(),
        })
    }
}

// ---------------------------------------------------------------------------
// Member queries
// ---------------------------------------------------------------------------

/// Members of one pool, in join order.
#[derive(Debug, Clone, Copy)]
pub struct ListMembers {
    pub pool_id: PoolId,
}

impl Processor<ListMembers> for SusuEngine {
    type Output = Vec<MemberRecord>;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:ListMembers")]
    async fn process(&self, query: ListMembers) -> Result<Vec<MemberRecord>, EngineError> {
        let aggregate = self.aggregate(query.pool_id).await?;
        let aggregate = aggregate.lock().await;
        Ok(aggregate.members.clone())
    }
}

#[derive(Debug, Clone)]
pub struct GetMember {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
}

impl Processor<GetMember> for SusuEngine {
    type Output = MemberRecord;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:GetMember")]
    async fn process(&self, query: GetMember) -> Result<MemberRecord, EngineError> {
        let aggregate = self.aggregate(query.pool_id).await?;
        let aggregate = aggregate.lock().await;
        aggregate
            .member(&query.wallet)
            .cloned()
            .ok_or_else(|| LifecycleError::NotAMember { wallet: query.wallet }.into())
    }
}

/// Pools a wallet belongs to.
#[derive(Debug, Clone)]
pub struct GetMemberPools {
    pub wallet: WalletAddress,
}

impl Processor<GetMemberPools> for SusuEngine {
    type Output = Vec<PoolId>;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:GetMemberPools")]
    async fn process(&self, query: GetMemberPools) -> Result<Vec<PoolId>, EngineError> {
        let index = self.inner.wallet_index.read().await;
        let mut pools = index.get(&query.wallet).cloned().unwrap_or_default();
        pools.sort_unstable();
        Ok(pools)
    }
}

// ---------------------------------------------------------------------------
// Cycle and payout queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct GetCycle {
    pub pool_id: PoolId,
    pub cycle: u32,
}

impl Processor<GetCycle> for SusuEngine {
    type Output = CycleRecord;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:GetCycle")]
    async fn process(&self, query: GetCycle) -> Result<CycleRecord, EngineError> {
        let aggregate = self.aggregate(query.pool_id).await?;
        let aggregate = aggregate.lock().await;
        aggregate
            .cycles
            .get(query.cycle as usize)
            .cloned()
            .ok_or(EngineError::UnknownCycle(query.pool_id, query.cycle))
    }
}

/// The payout order fixed at activation, plus the next payee in line.
#[derive(Debug, Clone, Copy)]
pub struct GetPayoutOrder {
    pub pool_id: PoolId,
}

impl Processor<GetPayoutOrder> for SusuEngine {
    type Output = PayoutOrderView;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:GetPayoutOrder")]
    async fn process(&self, query: GetPayoutOrder) -> Result<PayoutOrderView, EngineError> {
        let aggregate = self.aggregate(query.pool_id).await?;
        let aggregate = aggregate.lock().await;
        let Some(order) = aggregate.payout_order.as_ref() else {
            // Order does not exist until activation.
            return Err(SettlementError::PoolNotActive.into());
        };
        let next_payee = rotation::resolve_payee(&order.positions, &aggregate.members)
            .map(|m| m.wallet.clone());
        Ok(PayoutOrderView {
            pool_id: query.pool_id,
            wallets: aggregate.payout_wallets(),
            seed: order.seed,
            next_payee,
        })
    }
}

/// What a full pot would pay under the pool's terms: capacity times the
/// contribution amount, split by the fee rate.
#[derive(Debug, Clone, Copy)]
pub struct GetExpectedPayout {
    pub pool_id: PoolId,
}

impl Processor<GetExpectedPayout> for SusuEngine {
    type Output = ExpectedPayout;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:GetExpectedPayout")]
    async fn process(&self, query: GetExpectedPayout) -> Result<ExpectedPayout, EngineError> {
        let aggregate = self.aggregate(query.pool_id).await?;
        let aggregate = aggregate.lock().await;
        let projected_pot = aggregate
            .pool
            .contribution_amount
            .checked_mul_u32(aggregate.pool.capacity)
            .unwrap_or(TokenAmount::new(u128::MAX));
        let split = fees::split_fee(projected_pot, aggregate.pool.fee_bps);
        Ok(ExpectedPayout {
            projected_pot,
            fee: split.fee,
            net: split.net,
        })
    }
}

// ---------------------------------------------------------------------------
// Hub queries
// ---------------------------------------------------------------------------

/// All hubs, ordered by id, with graduate counts.
#[derive(Debug, Clone, Copy)]
pub struct ListHubs;

impl Processor<ListHubs> for SusuEngine {
    type Output = Vec<HubView>;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:ListHubs")]
    async fn process(&self, _query: ListHubs) -> Result<Vec<HubView>, EngineError> {
        let hubs = self.inner.hubs.read().await;
        let graduations = self.inner.graduations.read().await;
        Ok(hubs
            .values()
            .map(|hub| HubView {
                hub: hub.clone(),
                graduate_count: graduations
                    .iter()
                    .filter(|g| g.hub_id == hub.hub_id)
                    .count() as u32,
            })
            .sorted_by(|a, b| a.hub.hub_id.as_str().cmp(b.hub.hub_id.as_str()))
            .collect())
    }
}

/// Graduation edges recorded for one hub, in recording order.
#[derive(Debug, Clone)]
pub struct ListHubGraduates {
    pub hub_id: HubId,
}

impl Processor<ListHubGraduates> for SusuEngine {
    type Output = Vec<GraduationRecord>;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:ListHubGraduates")]
    async fn process(&self, query: ListHubGraduates) -> Result<Vec<GraduationRecord>, EngineError> {
        {
            let hubs = self.inner.hubs.read().await;
            if !hubs.contains_key(&query.hub_id) {
                return Err(GraduationError::UnknownHub {
                    hub_id: query.hub_id,
                }
                .into());
            }
        }
        let graduations = self.inner.graduations.read().await;
        Ok(graduations
            .iter()
            .filter(|g| g.hub_id == query.hub_id)
            .cloned()
            .collect())
    }
}
