use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kanau::processor::Processor;
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{HubId, PoolId, TokenRef, WalletAddress};
use time::{Duration, OffsetDateTime};

use super::*;
use crate::config::EngineConfig;
use crate::entities::{
    AdmissionMode, DissolutionReason, HubKind, MemberStatus, PoolStatus, RotationMode,
};
use crate::errors::{
    AdmissionError, ContributionError, GraduationError, SettlementError, ValidationError,
};
use crate::events::{EventSenders, PoolEventReceiver, pool_event_channel};
use crate::framework::{
    AccountRef, FixedSeedProvider, InMemoryLedger, LedgerError, ManualClock, TokenLedger,
};
use crate::rotation;

fn wallet(name: &str) -> WalletAddress {
    WalletAddress::from(name)
}

fn token() -> TokenRef {
    TokenRef::from("token-usd")
}

/// Ledger wrapper that counts transfer attempts, so tests can assert a
/// replayed operation moved nothing.
struct CountingLedger {
    inner: InMemoryLedger,
    transfers: AtomicUsize,
}

impl CountingLedger {
    fn new() -> Self {
        Self {
            inner: InMemoryLedger::new(),
            transfers: AtomicUsize::new(0),
        }
    }

    fn transfer_count(&self) -> usize {
        self.transfers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenLedger for CountingLedger {
    async fn transfer(
        &self,
        token: &TokenRef,
        from: &AccountRef,
        to: &AccountRef,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        self.inner.transfer(token, from, to, amount).await
    }

    async fn balance(
        &self,
        token: &TokenRef,
        account: &AccountRef,
    ) -> Result<TokenAmount, LedgerError> {
        self.inner.balance(token, account).await
    }
}

/// Engine wired to a counting ledger, a manual clock, and fixed entropy.
struct Bench {
    engine: SusuEngine,
    ledger: Arc<CountingLedger>,
    clock: Arc<ManualClock>,
    _events: PoolEventReceiver,
}

impl Bench {
    fn new() -> Self {
        let ledger = Arc::new(CountingLedger::new());
        let clock = Arc::new(ManualClock::new(OffsetDateTime::UNIX_EPOCH));
        let (sender, receiver) = pool_event_channel();
        let engine = SusuEngine::new(
            EngineConfig::default(),
            ledger.clone(),
            Arc::new(FixedSeedProvider([7u8; 32])),
            clock.clone(),
            EventSenders::new(sender),
        );
        Self {
            engine,
            ledger,
            clock,
            _events: receiver,
        }
    }

    /// A valid creation command: fixed rotation, open join, no protocol
    /// fee, 1000 per cycle, weekly cycles with a one-day grace window,
    /// starting an hour from now.
    fn create_command(&self, capacity: u32) -> CreatePool {
        CreatePool {
            creator: wallet("creator"),
            token: token(),
            capacity,
            contribution_amount: TokenAmount::new(1_000),
            cycle_duration: Duration::days(7),
            grace_period: Some(Duration::days(1)),
            starts_at: self.clock.now() + Duration::hours(1),
            rotation_mode: RotationMode::Fixed,
            admission_mode: AdmissionMode::OpenJoin,
            fee_bps: 0,
            late_fee_bps: Some(200),
        }
    }

    async fn fund(&self, name: &str, amount: u128) {
        self.ledger
            .inner
            .mint(
                &token(),
                &AccountRef::Wallet(wallet(name)),
                TokenAmount::new(amount),
            )
            .await;
    }

    async fn wallet_balance(&self, name: &str) -> TokenAmount {
        self.ledger
            .balance(&token(), &AccountRef::Wallet(wallet(name)))
            .await
            .unwrap()
    }

    async fn escrow_balance(&self, pool_id: PoolId) -> TokenAmount {
        self.ledger
            .balance(&token(), &AccountRef::PoolEscrow(pool_id))
            .await
            .unwrap()
    }

    /// Create the pool, fill it with `member-0..capacity` funded with
    /// 100_000 each, and activate it at its start time.
    async fn active_pool(&self, command: CreatePool) -> PoolId {
        let capacity = command.capacity;
        let starts_at = command.starts_at;
        let pool = self.engine.process(command).await.unwrap();
        for i in 0..capacity {
            let name = format!("member-{i}");
            self.fund(&name, 100_000).await;
            self.engine
                .process(JoinPool {
                    pool_id: pool.pool_id,
                    wallet: wallet(&name),
                })
                .await
                .unwrap();
        }
        self.clock.set(starts_at);
        self.engine
            .process(ActivatePool {
                pool_id: pool.pool_id,
            })
            .await
            .unwrap();
        pool.pool_id
    }

    async fn contribute(
        &self,
        pool_id: PoolId,
        cycle: u32,
        name: &str,
        amount: u128,
    ) -> Result<ContributionOutcome, EngineError> {
        self.engine
            .process(Contribute {
                pool_id,
                cycle,
                wallet: wallet(name),
                amount: TokenAmount::new(amount),
            })
            .await
    }

    async fn member(&self, pool_id: PoolId, name: &str) -> MemberRecord {
        self.engine
            .process(GetMember {
                pool_id,
                wallet: wallet(name),
            })
            .await
            .unwrap()
    }

    async fn pool(&self, pool_id: PoolId) -> PoolSnapshot {
        self.engine.process(GetPool { pool_id }).await.unwrap()
    }
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fixed_rotation_full_run_pays_each_member_once() {
    let bench = Bench::new();
    let mut command = bench.create_command(3);
    command.fee_bps = 100;
    let pool_id = bench.active_pool(command).await;

    for cycle in 0..3u32 {
        for i in 0..3 {
            bench
                .contribute(pool_id, cycle, &format!("member-{i}"), 1_000)
                .await
                .unwrap();
        }
        let receipt = bench
            .engine
            .process(SettleCycle { pool_id, cycle })
            .await
            .unwrap();
        // Fixed rotation pays in join order.
        assert_eq!(receipt.payee, wallet(&format!("member-{cycle}")));
        assert_eq!(receipt.pot, TokenAmount::new(3_000));
        assert_eq!(receipt.fee, TokenAmount::new(30));
        assert_eq!(receipt.disbursed, TokenAmount::new(2_970));
    }

    let snapshot = bench.pool(pool_id).await;
    assert_eq!(snapshot.pool.status, PoolStatus::Completed);
    assert_eq!(snapshot.pool.current_cycle, 3);
    assert_eq!(snapshot.pool.total_contributed, TokenAmount::new(9_000));
    assert_eq!(snapshot.pool.total_disbursed, TokenAmount::new(8_910));
    assert_eq!(snapshot.pool.total_fees_accrued, TokenAmount::new(90));

    for i in 0..3 {
        let member = bench.member(pool_id, &format!("member-{i}")).await;
        assert!(member.has_received_payout);
        assert_eq!(member.cycles_contributed, 3);
        assert_eq!(member.total_received, TokenAmount::new(2_970));
        assert_eq!(
            bench.wallet_balance(&format!("member-{i}")).await,
            TokenAmount::new(100_000 - 3_000 + 2_970)
        );
    }

    // The fee tokens stay in escrow; the treasury records the accrual.
    assert_eq!(bench.escrow_balance(pool_id).await, TokenAmount::new(90));
    assert_eq!(
        bench.engine.treasury().balance(&token()).await,
        TokenAmount::new(90)
    );
    assert_eq!(bench.engine.treasury().entries().await.len(), 3);
}

#[tokio::test]
async fn test_randomized_rotation_is_reproducible_from_stored_seed() {
    let bench = Bench::new();
    let mut command = bench.create_command(5);
    command.rotation_mode = RotationMode::Randomized;
    let starts_at = command.starts_at;
    let pool = bench.engine.process(command).await.unwrap();
    for i in 0..5 {
        bench
            .engine
            .process(JoinPool {
                pool_id: pool.pool_id,
                wallet: wallet(&format!("member-{i}")),
            })
            .await
            .unwrap();
    }
    bench.clock.set(starts_at);
    let outcome = bench
        .engine
        .process(ActivatePool {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap();

    assert_eq!(outcome.seed, Some([7u8; 32]));
    let mut sorted = outcome.payout_order.clone();
    sorted.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    let members: Vec<WalletAddress> = (0..5).map(|i| wallet(&format!("member-{i}"))).collect();
    assert_eq!(sorted, members);

    // Anyone holding the stored entropy can re-derive the permutation.
    let seed = rotation::derive_seed(&[7u8; 32], pool.pool_id);
    let expected: Vec<WalletAddress> = rotation::randomized_order(&seed, &[0, 1, 2, 3, 4])
        .into_iter()
        .map(|seq| wallet(&format!("member-{seq}")))
        .collect();
    assert_eq!(outcome.payout_order, expected);

    let view = bench
        .engine
        .process(GetPayoutOrder {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap();
    assert_eq!(view.wallets, expected);
    assert_eq!(view.seed, Some([7u8; 32]));
    assert_eq!(view.next_payee, Some(expected[0].clone()));
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_settlement_replay_returns_stored_receipt() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    for i in 0..2 {
        bench
            .contribute(pool_id, 0, &format!("member-{i}"), 1_000)
            .await
            .unwrap();
    }
    let first = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    let transfers = bench.ledger.transfer_count();

    // A replay returns the identical receipt and moves no funds.
    let replay = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    assert_eq!(replay, first);
    assert_eq!(bench.ledger.transfer_count(), transfers);

    // Still answerable after the pool completes.
    for i in 0..2 {
        bench
            .contribute(pool_id, 1, &format!("member-{i}"), 1_000)
            .await
            .unwrap();
    }
    bench
        .engine
        .process(SettleCycle { pool_id, cycle: 1 })
        .await
        .unwrap();
    assert_eq!(bench.pool(pool_id).await.pool.status, PoolStatus::Completed);

    let replay = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    assert_eq!(replay, first);
}

#[tokio::test]
async fn test_settlement_waits_for_contributions_or_grace() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    // One contribution outstanding, grace window still open.
    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();
    let err = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Settlement(SettlementError::CycleNotReady { waiting_on: 1 })
    ));

    // Only the current cycle can settle.
    let err = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 1 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Settlement(SettlementError::CycleNotReady { .. })
    ));

    bench.contribute(pool_id, 0, "member-1", 1_000).await.unwrap();
    bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_settlement_requires_an_active_pool() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool = bench.engine.process(command).await.unwrap();
    let err = bench
        .engine
        .process(SettleCycle {
            pool_id: pool.pool_id,
            cycle: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Settlement(SettlementError::PoolNotActive)
    ));
}

// ---------------------------------------------------------------------------
// Contributions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_late_contribution_pays_surcharge() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();

    // Past the deadline, inside the grace window: 2% surcharge due.
    bench.clock.advance(Duration::days(7) + Duration::hours(2));
    let err = bench
        .contribute(pool_id, 0, "member-1", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::AmountMismatch { expected, .. })
            if expected == TokenAmount::new(1_020)
    ));

    let outcome = bench
        .contribute(pool_id, 0, "member-1", 1_020)
        .await
        .unwrap();
    assert_eq!(outcome.entry.late_fee, TokenAmount::new(20));
    assert_eq!(outcome.pot, TokenAmount::new(2_020));
    assert!(outcome.cycle_ready);

    let member = bench.member(pool_id, "member-1").await;
    assert_eq!(member.late_fees_paid, TokenAmount::new(20));

    // The surcharge lands in the pot.
    let receipt = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    assert_eq!(receipt.pot, TokenAmount::new(2_020));
    assert_eq!(receipt.disbursed, TokenAmount::new(2_020));
}

#[tokio::test]
async fn test_contribution_window_closes_after_grace() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    bench.clock.advance(Duration::days(8) + Duration::seconds(1));
    let err = bench
        .contribute(pool_id, 0, "member-0", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::CycleClosed { cycle: 0 })
    ));
}

#[tokio::test]
async fn test_contribution_rejections() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    let err = bench
        .contribute(pool_id, 0, "member-0", 999)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::AmountMismatch { .. })
    ));

    let err = bench
        .contribute(pool_id, 1, "member-0", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::NotCurrentCycle {
            requested: 1,
            current: 0
        })
    ));

    let err = bench
        .contribute(pool_id, 0, "stranger", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::NotAMember { .. })
    ));

    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();
    let err = bench
        .contribute(pool_id, 0, "member-0", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::DuplicateContribution { .. })
    ));

    bench.contribute(pool_id, 0, "member-1", 1_000).await.unwrap();
    bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();

    // A settled cycle no longer accepts payments.
    let err = bench
        .contribute(pool_id, 0, "member-0", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::CycleClosed { cycle: 0 })
    ));
}

#[tokio::test]
async fn test_failed_transfer_leaves_cycle_untouched() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    bench
        .ledger
        .inner
        .freeze(&AccountRef::Wallet(wallet("member-0")))
        .await;
    let err = bench
        .contribute(pool_id, 0, "member-0", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Ledger(LedgerError::AccountFrozen { .. })
    ));
    assert_eq!(err.code(), "account_frozen");

    // Nothing was recorded, so the same payment succeeds after recovery.
    let cycle = bench
        .engine
        .process(GetCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    assert!(cycle.contributions.is_empty());
    assert_eq!(cycle.pot, TokenAmount::ZERO);

    bench
        .ledger
        .inner
        .unfreeze(&AccountRef::Wallet(wallet("member-0")))
        .await;
    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();
    assert_eq!(bench.member(pool_id, "member-0").await.cycles_contributed, 1);
}

// ---------------------------------------------------------------------------
// Defaults and forced dissolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_default_cascade_ends_in_forced_dissolution() {
    let bench = Bench::new();
    let command = bench.create_command(3);
    let pool_id = bench.active_pool(command).await;

    // member-1 never pays. The first miss leaves them active.
    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();
    bench.contribute(pool_id, 0, "member-2", 1_000).await.unwrap();
    bench.clock.advance(Duration::days(8) + Duration::hours(1));
    let receipt = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    assert_eq!(receipt.payee, wallet("member-0"));
    assert_eq!(receipt.pot, TokenAmount::new(2_000));
    let member = bench.member(pool_id, "member-1").await;
    assert_eq!(member.status, MemberStatus::Active);
    assert_eq!(member.cycles_missed, 1);

    // The second miss crosses the threshold before the payee is resolved,
    // so this payout already skips member-1.
    bench.contribute(pool_id, 1, "member-0", 1_000).await.unwrap();
    bench.contribute(pool_id, 1, "member-2", 1_000).await.unwrap();
    bench.clock.advance(Duration::days(8) + Duration::hours(1));
    let receipt = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 1 })
        .await
        .unwrap();
    assert_eq!(receipt.payee, wallet("member-2"));
    let member = bench.member(pool_id, "member-1").await;
    assert_eq!(member.status, MemberStatus::Defaulted);
    assert_eq!(member.cycles_missed, 2);

    // Everyone left has been paid: the last cycle has no payee, and the
    // pool dissolves with its unsettled contributions refunded.
    bench.contribute(pool_id, 2, "member-0", 1_000).await.unwrap();
    bench.contribute(pool_id, 2, "member-2", 1_000).await.unwrap();
    let err = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 2 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Settlement(SettlementError::NoEligiblePayee)
    ));

    let snapshot = bench.pool(pool_id).await;
    assert_eq!(snapshot.pool.status, PoolStatus::Dissolved);
    assert_eq!(
        snapshot.pool.dissolution_reason,
        Some(DissolutionReason::NoEligiblePayee)
    );
    let cycle = bench
        .engine
        .process(GetCycle { pool_id, cycle: 2 })
        .await
        .unwrap();
    assert!(cycle.settlement.is_none());

    // Each payer got one pot and one refund, so everything nets out.
    assert_eq!(bench.escrow_balance(pool_id).await, TokenAmount::ZERO);
    for name in ["member-0", "member-1", "member-2"] {
        assert_eq!(bench.wallet_balance(name).await, TokenAmount::new(100_000));
    }
}

#[tokio::test]
async fn test_dissolution_refunds_retry_after_ledger_recovery() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();
    bench.clock.advance(Duration::days(8) + Duration::hours(1));
    bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();

    bench.contribute(pool_id, 1, "member-0", 1_000).await.unwrap();
    bench.clock.advance(Duration::days(8) + Duration::hours(1));

    // The custodian rejects member-0 just as the forced dissolution tries
    // to refund them.
    bench
        .ledger
        .inner
        .freeze(&AccountRef::Wallet(wallet("member-0")))
        .await;
    let err = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 1 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Settlement(SettlementError::NoEligiblePayee)
    ));

    let outcome = bench
        .engine
        .process(DissolvePool {
            pool_id,
            initiator: None,
            reason: None,
        })
        .await
        .unwrap();
    assert_eq!(outcome.pool.status, PoolStatus::Dissolved);
    assert_eq!(outcome.refunds.len(), 1);
    assert!(!outcome.refunds[0].completed);

    // Replaying the dissolution after recovery completes the leg.
    bench
        .ledger
        .inner
        .unfreeze(&AccountRef::Wallet(wallet("member-0")))
        .await;
    let outcome = bench
        .engine
        .process(DissolvePool {
            pool_id,
            initiator: None,
            reason: None,
        })
        .await
        .unwrap();
    assert!(outcome.refunds.iter().all(|leg| leg.completed));
    assert_eq!(outcome.refunds[0].amount, TokenAmount::new(1_000));
    assert_eq!(
        bench.wallet_balance("member-0").await,
        TokenAmount::new(100_000)
    );
    assert_eq!(bench.escrow_balance(pool_id).await, TokenAmount::ZERO);
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_pool_refuses_joiners_in_any_admission_mode() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool = bench.engine.process(command).await.unwrap();
    for i in 0..2 {
        bench
            .engine
            .process(JoinPool {
                pool_id: pool.pool_id,
                wallet: wallet(&format!("member-{i}")),
            })
            .await
            .unwrap();
    }
    let err = bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("late-arrival"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Admission(AdmissionError::CapacityExceeded { capacity: 2 })
    ));

    // Same answer for a full invite pool, invitation in hand or not.
    let mut command = bench.create_command(2);
    command.admission_mode = AdmissionMode::Invite;
    let pool = bench.engine.process(command).await.unwrap();
    for i in 0..3 {
        bench
            .engine
            .process(InviteMember {
                pool_id: pool.pool_id,
                creator: wallet("creator"),
                wallet: wallet(&format!("guest-{i}")),
            })
            .await
            .unwrap();
    }
    for i in 0..2 {
        bench
            .engine
            .process(JoinPool {
                pool_id: pool.pool_id,
                wallet: wallet(&format!("guest-{i}")),
            })
            .await
            .unwrap();
    }
    let err = bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("guest-2"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Admission(AdmissionError::CapacityExceeded { .. })
    ));
}

#[tokio::test]
async fn test_invite_mode_gates_admission() {
    let bench = Bench::new();
    let mut command = bench.create_command(3);
    command.admission_mode = AdmissionMode::Invite;
    let pool = bench.engine.process(command).await.unwrap();

    let err = bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("guest"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Admission(AdmissionError::NotInvited { .. })
    ));

    // Only the creator extends invitations.
    let err = bench
        .engine
        .process(InviteMember {
            pool_id: pool.pool_id,
            creator: wallet("guest"),
            wallet: wallet("guest"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::NotCreator { .. })
    ));

    bench
        .engine
        .process(InviteMember {
            pool_id: pool.pool_id,
            creator: wallet("creator"),
            wallet: wallet("guest"),
        })
        .await
        .unwrap();
    let member = bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("guest"),
        })
        .await
        .unwrap();
    assert_eq!(member.status, MemberStatus::Pending);
    assert_eq!(member.join_sequence, 0);

    let err = bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("guest"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Admission(AdmissionError::AlreadyMember { .. })
    ));
}

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_activation_gates() {
    let bench = Bench::new();
    let command = bench.create_command(3);
    let starts_at = command.starts_at;
    let pool = bench.engine.process(command).await.unwrap();
    for i in 0..2 {
        bench
            .engine
            .process(JoinPool {
                pool_id: pool.pool_id,
                wallet: wallet(&format!("member-{i}")),
            })
            .await
            .unwrap();
    }

    // Too early.
    let err = bench
        .engine
        .process(ActivatePool {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::StartTimeNotReached { .. })
    ));

    // On time but underfull.
    bench.clock.set(starts_at);
    let err = bench
        .engine
        .process(ActivatePool {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::ActivationNotReady {
            members: 2,
            capacity: 3
        })
    ));

    bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("member-2"),
        })
        .await
        .unwrap();
    bench
        .engine
        .process(ActivatePool {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap();

    // Members flip from pending to active and cycle 0 opens.
    let member = bench.member(pool.pool_id, "member-0").await;
    assert_eq!(member.status, MemberStatus::Active);
    let cycle = bench
        .engine
        .process(GetCycle {
            pool_id: pool.pool_id,
            cycle: 0,
        })
        .await
        .unwrap();
    assert_eq!(cycle.cycle_index, 0);
    assert_eq!(cycle.deadline, starts_at + Duration::days(7));
    assert_eq!(cycle.grace_deadline, starts_at + Duration::days(8));

    // A second activation is an invalid transition.
    let err = bench
        .engine
        .process(ActivatePool {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_underfull_pool_dissolves_after_activation_window() {
    let bench = Bench::new();
    let command = bench.create_command(3);
    let starts_at = command.starts_at;
    let pool = bench.engine.process(command).await.unwrap();
    bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("member-0"),
        })
        .await
        .unwrap();

    bench
        .clock
        .set(starts_at + Duration::days(7) + Duration::hours(1));
    let err = bench
        .engine
        .process(ActivatePool {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::ActivationExpired)
    ));

    let snapshot = bench.pool(pool.pool_id).await;
    assert_eq!(snapshot.pool.status, PoolStatus::Dissolved);
    assert_eq!(
        snapshot.pool.dissolution_reason,
        Some(DissolutionReason::ActivationExpired)
    );
}

// ---------------------------------------------------------------------------
// Requested dissolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_creator_cancels_open_pool() {
    let bench = Bench::new();
    let command = bench.create_command(3);
    let pool = bench.engine.process(command).await.unwrap();
    bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("member-0"),
        })
        .await
        .unwrap();

    let err = bench
        .engine
        .process(DissolvePool {
            pool_id: pool.pool_id,
            initiator: Some(wallet("member-0")),
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::NotCreator { .. })
    ));

    let outcome = bench
        .engine
        .process(DissolvePool {
            pool_id: pool.pool_id,
            initiator: Some(wallet("creator")),
            reason: Some("plans changed".to_owned()),
        })
        .await
        .unwrap();
    assert_eq!(outcome.pool.status, PoolStatus::Dissolved);
    assert_eq!(
        outcome.pool.dissolution_reason,
        Some(DissolutionReason::CreatorCancelled {
            reason: Some("plans changed".to_owned())
        })
    );
    // Nothing was escrowed while open, so nothing is owed back.
    assert!(outcome.refunds.is_empty());
}

#[tokio::test]
async fn test_active_pool_refuses_requested_dissolution() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;
    let err = bench
        .engine
        .process(DissolvePool {
            pool_id,
            initiator: Some(wallet("creator")),
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::DissolveRefused {
            status: PoolStatus::Active
        })
    ));
}

// ---------------------------------------------------------------------------
// Exits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_exit_from_open_pool_reopens_the_seat() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let starts_at = command.starts_at;
    let pool = bench.engine.process(command).await.unwrap();
    for name in ["ada", "ben"] {
        bench
            .engine
            .process(JoinPool {
                pool_id: pool.pool_id,
                wallet: wallet(name),
            })
            .await
            .unwrap();
    }

    let exited = bench
        .engine
        .process(ExitPool {
            pool_id: pool.pool_id,
            wallet: wallet("ada"),
        })
        .await
        .unwrap();
    assert_eq!(exited.status, MemberStatus::Exited);
    assert_eq!(bench.pool(pool.pool_id).await.member_count, 1);

    // The reopened seat gets a fresh join sequence.
    let replacement = bench
        .engine
        .process(JoinPool {
            pool_id: pool.pool_id,
            wallet: wallet("chi"),
        })
        .await
        .unwrap();
    assert_eq!(replacement.join_sequence, 2);

    bench.clock.set(starts_at);
    let outcome = bench
        .engine
        .process(ActivatePool {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap();
    assert_eq!(outcome.payout_order, vec![wallet("ben"), wallet("chi")]);

    // The departed wallet no longer shows this pool.
    let pools = bench
        .engine
        .process(GetMemberPools {
            wallet: wallet("ada"),
        })
        .await
        .unwrap();
    assert!(pools.is_empty());
}

#[tokio::test]
async fn test_exit_while_active_forfeits_contributions() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();
    bench.contribute(pool_id, 0, "member-1", 1_000).await.unwrap();
    let exited = bench
        .engine
        .process(ExitPool {
            pool_id,
            wallet: wallet("member-0"),
        })
        .await
        .unwrap();
    assert_eq!(exited.status, MemberStatus::Exited);

    // The exited member's payment stays in the pot and the payout skips
    // them.
    let receipt = bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    assert_eq!(receipt.payee, wallet("member-1"));
    assert_eq!(receipt.pot, TokenAmount::new(2_000));
    assert_eq!(receipt.disbursed, TokenAmount::new(2_000));

    // They can neither pay into later cycles nor exit twice.
    let err = bench
        .contribute(pool_id, 1, "member-0", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contribution(ContributionError::MemberNotParticipating { .. })
    ));
    let err = bench
        .engine
        .process(ExitPool {
            pool_id,
            wallet: wallet("member-0"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::ExitRefused { .. })
    ));
}

// ---------------------------------------------------------------------------
// Graduation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_graduation_into_hubs() {
    let bench = Bench::new();
    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;
    for cycle in 0..2 {
        for i in 0..2 {
            bench
                .contribute(pool_id, cycle, &format!("member-{i}"), 1_000)
                .await
                .unwrap();
        }
        bench
            .engine
            .process(SettleCycle { pool_id, cycle })
            .await
            .unwrap();
    }
    assert_eq!(bench.pool(pool_id).await.pool.status, PoolStatus::Completed);

    let hub = bench
        .engine
        .process(RegisterHub {
            hub_id: HubId::from("accra-traders"),
            name: "Accra Traders".to_owned(),
            kind: HubKind::Region,
            description: None,
        })
        .await
        .unwrap();
    assert!(hub.active);

    // Registration is idempotent on the id.
    let again = bench
        .engine
        .process(RegisterHub {
            hub_id: HubId::from("accra-traders"),
            name: "Renamed".to_owned(),
            kind: HubKind::Purpose,
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(again, hub);

    let record = bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("member-0"),
            hub_id: HubId::from("accra-traders"),
        })
        .await
        .unwrap();
    assert_eq!(record.source_pool, pool_id);
    assert_eq!(
        bench.member(pool_id, "member-0").await.status,
        MemberStatus::Graduated
    );

    // The same edge is recorded once.
    let err = bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("member-0"),
            hub_id: HubId::from("accra-traders"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Graduation(GraduationError::AlreadyGraduated { .. })
    ));

    // A second hub is a new edge.
    bench
        .engine
        .process(RegisterHub {
            hub_id: HubId::from("market-women"),
            name: "Market Women".to_owned(),
            kind: HubKind::Purpose,
            description: Some("working capital circles".to_owned()),
        })
        .await
        .unwrap();
    bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("member-0"),
            hub_id: HubId::from("market-women"),
        })
        .await
        .unwrap();

    let hubs = bench.engine.process(ListHubs).await.unwrap();
    assert_eq!(hubs.len(), 2);
    assert_eq!(hubs[0].hub.hub_id, HubId::from("accra-traders"));
    assert_eq!(hubs[0].graduate_count, 1);
    assert_eq!(hubs[1].graduate_count, 1);

    let graduates = bench
        .engine
        .process(ListHubGraduates {
            hub_id: HubId::from("accra-traders"),
        })
        .await
        .unwrap();
    assert_eq!(graduates.len(), 1);
    assert_eq!(graduates[0].wallet, wallet("member-0"));
}

#[tokio::test]
async fn test_graduation_eligibility_rules() {
    let bench = Bench::new();
    bench
        .engine
        .process(RegisterHub {
            hub_id: HubId::from("hub"),
            name: "Hub".to_owned(),
            kind: HubKind::Region,
            description: None,
        })
        .await
        .unwrap();

    let command = bench.create_command(2);
    let pool_id = bench.active_pool(command).await;

    // Nobody graduates from a pool still running.
    let err = bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("member-0"),
            hub_id: HubId::from("hub"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Graduation(GraduationError::PoolNotCompleted { .. })
    ));

    // Run to completion with member-1 missing the first cycle.
    bench.contribute(pool_id, 0, "member-0", 1_000).await.unwrap();
    bench.clock.advance(Duration::days(8) + Duration::hours(1));
    bench
        .engine
        .process(SettleCycle { pool_id, cycle: 0 })
        .await
        .unwrap();
    for i in 0..2 {
        bench
            .contribute(pool_id, 1, &format!("member-{i}"), 1_000)
            .await
            .unwrap();
    }
    bench
        .engine
        .process(SettleCycle { pool_id, cycle: 1 })
        .await
        .unwrap();
    assert_eq!(bench.pool(pool_id).await.pool.status, PoolStatus::Completed);

    // A missed cycle disqualifies, even without a default.
    let err = bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("member-1"),
            hub_id: HubId::from("hub"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Graduation(GraduationError::NotEligible { .. })
    ));

    let err = bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("member-0"),
            hub_id: HubId::from("ghost"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Graduation(GraduationError::UnknownHub { .. })
    ));

    let err = bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("stranger"),
            hub_id: HubId::from("hub"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Graduation(GraduationError::NotEligible { .. })
    ));

    // The clean member graduates.
    bench
        .engine
        .process(Graduate {
            pool_id,
            wallet: wallet("member-0"),
            hub_id: HubId::from("hub"),
        })
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Creation validation and queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_pool_creation_validation() {
    let bench = Bench::new();

    let err = bench
        .engine
        .process(CreatePool {
            capacity: 1,
            ..bench.create_command(2)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::CapacityOutOfRange {
            requested: 1,
            min: 2,
            max: 50
        })
    ));

    let err = bench
        .engine
        .process(CreatePool {
            capacity: 51,
            ..bench.create_command(2)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::CapacityOutOfRange { .. })
    ));

    let err = bench
        .engine
        .process(CreatePool {
            contribution_amount: TokenAmount::ZERO,
            ..bench.create_command(2)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::ContributionAmountZero)
    ));

    let err = bench
        .engine
        .process(CreatePool {
            cycle_duration: Duration::ZERO,
            ..bench.create_command(2)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::CycleDurationNotPositive)
    ));

    let err = bench
        .engine
        .process(CreatePool {
            fee_bps: 1_001,
            ..bench.create_command(2)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::FeeAboveCap { .. })
    ));

    let err = bench
        .engine
        .process(CreatePool {
            late_fee_bps: Some(501),
            ..bench.create_command(2)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::LateFeeAboveCap { .. })
    ));

    let err = bench
        .engine
        .process(CreatePool {
            starts_at: bench.clock.now(),
            ..bench.create_command(2)
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::StartTimeNotInFuture { .. })
    ));
}

#[tokio::test]
async fn test_queries_reflect_engine_state() {
    let bench = Bench::new();
    let first = bench.active_pool(bench.create_command(2)).await;
    let command = bench.create_command(3);
    let second = bench.engine.process(command).await.unwrap().pool_id;
    bench
        .engine
        .process(JoinPool {
            pool_id: second,
            wallet: wallet("member-0"),
        })
        .await
        .unwrap();

    let pools = bench.engine.process(ListPools).await.unwrap();
    assert_eq!(pools.len(), 2);
    assert_eq!(pools[0].pool.pool_id, first);
    assert_eq!(pools[0].member_count, 2);
    assert_eq!(pools[1].pool.pool_id, second);
    assert_eq!(pools[1].member_count, 1);

    // member-0 belongs to both pools.
    let member_pools = bench
        .engine
        .process(GetMemberPools {
            wallet: wallet("member-0"),
        })
        .await
        .unwrap();
    assert_eq!(member_pools, vec![first, second]);

    let members = bench
        .engine
        .process(ListMembers { pool_id: first })
        .await
        .unwrap();
    assert_eq!(members.len(), 2);

    let err = bench
        .engine
        .process(GetMember {
            pool_id: first,
            wallet: wallet("stranger"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Lifecycle(LifecycleError::NotAMember { .. })
    ));

    let err = bench
        .engine
        .process(GetCycle {
            pool_id: first,
            cycle: 5,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownCycle(_, 5)));

    // No payout order exists before activation.
    let err = bench
        .engine
        .process(GetPayoutOrder { pool_id: second })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Settlement(SettlementError::PoolNotActive)
    ));

    let err = bench
        .engine
        .process(GetPool {
            pool_id: PoolId(99),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownPool(PoolId(99))));
}

#[tokio::test]
async fn test_expected_payout_projection() {
    let bench = Bench::new();
    let mut command = bench.create_command(3);
    command.fee_bps = 250;
    let pool = bench.engine.process(command).await.unwrap();

    let expected = bench
        .engine
        .process(GetExpectedPayout {
            pool_id: pool.pool_id,
        })
        .await
        .unwrap();
    assert_eq!(expected.projected_pot, TokenAmount::new(3_000));
    assert_eq!(expected.fee, TokenAmount::new(75));
    assert_eq!(expected.net, TokenAmount::new(2_925));
}
