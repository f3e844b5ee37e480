//! The engine: every pool transition and query, as processor messages.
//!
//! Operations are messages handled by [`SusuEngine`] through
//! `kanau::processor::Processor`. Transitions against one pool run
//! serialized behind that pool's lock and either commit in full or return
//! a typed error with no state change; operations on different pools
//! proceed concurrently. There is no background driver: activation,
//! settlement, and dissolution are caller-triggered and safe to replay.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{HubId, PoolId, WalletAddress};
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};

use crate::config::EngineConfig;
use crate::entities::{
    CycleRecord, GraduationRecord, HubRecord, MemberRecord, PoolRecord, PoolStatus,
};
use crate::errors::{EngineError, LifecycleError};
use crate::events::{EventSenders, PoolEvent};
use crate::framework::{Clock, SeedProvider, TokenLedger};
use crate::treasury::TreasuryLedger;

mod activate;
mod contribute;
mod create_pool;
mod dissolve;
mod graduate;
mod membership;
mod queries;
mod settle;

#[cfg(test)]
mod tests;

pub use activate::{ActivatePool, ActivationOutcome};
pub use contribute::{Contribute, ContributionOutcome};
pub use create_pool::CreatePool;
pub use dissolve::{DissolutionOutcome, DissolvePool};
pub use graduate::{Graduate, RegisterHub};
pub use membership::{ExitPool, InviteMember, JoinPool};
pub use queries::{
    ExpectedPayout, GetCycle, GetExpectedPayout, GetMember, GetMemberPools, GetPayoutOrder,
    GetPool, HubView, ListHubGraduates, ListHubs, ListMembers, ListPools, PayoutOrderView,
    PoolSnapshot,
};
pub use settle::SettleCycle;

// ---------------------------------------------------------------------------
// Per-pool state
// ---------------------------------------------------------------------------

/// Payout order fixed at activation.
///
/// `positions` holds join sequences, first payee first. For randomized
/// rotation `seed` carries the activation entropy; the permutation is
/// re-derivable from it via [`crate::rotation`], so any party can audit
/// the order.
#[derive(Debug, Clone)]
pub struct PayoutOrder {
    pub seed: Option<[u8; 32]>,
    pub positions: Vec<u32>,
}

/// One refund owed after dissolution. Legs that fail at the ledger stay
/// incomplete and are retried when dissolution is invoked again.
#[derive(Debug, Clone)]
pub struct RefundEntry {
    pub wallet: WalletAddress,
    pub amount: TokenAmount,
    pub completed: bool,
}

/// Everything the engine holds for one pool, guarded by a single lock.
#[derive(Debug)]
pub struct PoolAggregate {
    pub pool: PoolRecord,
    /// Members in join order.
    pub members: Vec<MemberRecord>,
    /// Wallets the creator has invited (invite-mode pools).
    pub invites: HashSet<WalletAddress>,
    pub cycles: Vec<CycleRecord>,
    /// Set once, at activation.
    pub payout_order: Option<PayoutOrder>,
    /// Refund legs owed after dissolution.
    pub refunds: Vec<RefundEntry>,
    /// Next join sequence to hand out. Never reused, even after an exit
    /// while the pool was still open.
    next_join_sequence: u32,
}

impl PoolAggregate {
    fn new(pool: PoolRecord) -> Self {
        Self {
            pool,
            members: Vec::new(),
            invites: HashSet::new(),
            cycles: Vec::new(),
            payout_order: None,
            refunds: Vec::new(),
            next_join_sequence: 0,
        }
    }

    pub fn member(&self, wallet: &WalletAddress) -> Option<&MemberRecord> {
        self.members.iter().find(|m| &m.wallet == wallet)
    }

    pub(crate) fn member_mut(&mut self, wallet: &WalletAddress) -> Option<&mut MemberRecord> {
        self.members.iter_mut().find(|m| &m.wallet == wallet)
    }

    pub fn member_by_sequence(&self, sequence: u32) -> Option<&MemberRecord> {
        self.members.iter().find(|m| m.join_sequence == sequence)
    }

    pub fn member_count(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn current_cycle(&self) -> Option<&CycleRecord> {
        self.cycles.get(self.pool.current_cycle as usize)
    }

    fn allocate_join_sequence(&mut self) -> u32 {
        let sequence = self.next_join_sequence;
        self.next_join_sequence += 1;
        sequence
    }

    /// Move the pool to `next`, refusing anything the lifecycle forbids.
    pub(crate) fn transition(&mut self, next: PoolStatus) -> Result<(), LifecycleError> {
        if !self.pool.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.pool.status,
                attempted: next,
            });
        }
        self.pool.status = next;
        Ok(())
    }

    /// Participating members that have not paid into the current cycle.
    pub fn waiting_on(&self) -> Vec<WalletAddress> {
        match self.current_cycle() {
            Some(cycle) => self
                .members
                .iter()
                .filter(|m| m.status.is_participating() && !cycle.has_contributed(&m.wallet))
                .map(|m| m.wallet.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether every participating member has paid into the current cycle.
    pub fn cycle_ready(&self) -> bool {
        self.current_cycle().is_some() && self.waiting_on().is_empty()
    }

    /// The stored payout order as wallets, first payee first.
    pub fn payout_wallets(&self) -> Vec<WalletAddress> {
        match &self.payout_order {
            Some(order) => order
                .positions
                .iter()
                .filter_map(|seq| self.member_by_sequence(*seq))
                .map(|m| m.wallet.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

struct EngineInner {
    config: EngineConfig,
    ledger: Arc<dyn TokenLedger>,
    seeds: Arc<dyn SeedProvider>,
    clock: Arc<dyn Clock>,
    treasury: TreasuryLedger,
    events: EventSenders,
    pools: RwLock<HashMap<PoolId, Arc<Mutex<PoolAggregate>>>>,
    /// Pools each wallet belongs to, for the member-pools query.
    wallet_index: RwLock<HashMap<WalletAddress, Vec<PoolId>>>,
    hubs: RwLock<HashMap<HubId, HubRecord>>,
    graduations: RwLock<Vec<GraduationRecord>>,
    next_pool_id: AtomicU64,
}

/// Handle to the engine. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct SusuEngine {
    inner: Arc<EngineInner>,
}

impl SusuEngine {
    pub fn new(
        config: EngineConfig,
        ledger: Arc<dyn TokenLedger>,
        seeds: Arc<dyn SeedProvider>,
        clock: Arc<dyn Clock>,
        events: EventSenders,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                ledger,
                seeds,
                clock,
                treasury: TreasuryLedger::new(),
                events,
                pools: RwLock::new(HashMap::new()),
                wallet_index: RwLock::new(HashMap::new()),
                hubs: RwLock::new(HashMap::new()),
                graduations: RwLock::new(Vec::new()),
                next_pool_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn treasury(&self) -> &TreasuryLedger {
        &self.inner.treasury
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        self.inner.clock.now()
    }

    pub(crate) fn emit(&self, event: PoolEvent) {
        self.inner.events.emit(event);
    }

    pub(crate) fn allocate_pool_id(&self) -> PoolId {
        PoolId(self.inner.next_pool_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Fetch the lock handle for one pool. The map read lock is released
    /// before the caller locks the aggregate.
    pub(crate) async fn aggregate(
        &self,
        pool_id: PoolId,
    ) -> Result<Arc<Mutex<PoolAggregate>>, EngineError> {
        let pools = self.inner.pools.read().await;
        pools
            .get(&pool_id)
            .cloned()
            .ok_or(EngineError::UnknownPool(pool_id))
    }

    pub(crate) async fn insert_aggregate(&self, aggregate: PoolAggregate) {
        let pool_id = aggregate.pool.pool_id;
        let mut pools = self.inner.pools.write().await;
        pools.insert(pool_id, Arc::new(Mutex::new(aggregate)));
    }

    pub(crate) async fn index_wallet(&self, wallet: &WalletAddress, pool_id: PoolId) {
        let mut index = self.inner.wallet_index.write().await;
        let pools = index.entry(wallet.clone()).or_default();
        if !pools.contains(&pool_id) {
            pools.push(pool_id);
        }
    }

    pub(crate) async fn unindex_wallet(&self, wallet: &WalletAddress, pool_id: PoolId) {
        let mut index = self.inner.wallet_index.write().await;
        if let Some(pools) = index.get_mut(wallet) {
            pools.retain(|p| *p != pool_id);
        }
    }
}
