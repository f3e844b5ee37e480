//! Pool dissolution, the terminal failure path.
//!
//! A pool dissolves in one of three ways: the creator cancels it while it
//! is still open, an activation attempt finds it underfull past its
//! window, or settlement finds no eligible payee. The transition itself
//! commits atomically; refund transfers run afterwards, and any leg the
//! ledger refuses stays outstanding and is retried by invoking
//! [`DissolvePool`] again on the dissolved pool.

use kanau::processor::Processor;
use susu_sdk::objects::{PoolId, WalletAddress};

use super::{PoolAggregate, RefundEntry, SusuEngine};
use crate::entities::{DissolutionReason, PoolRecord, PoolStatus};
use crate::errors::{EngineError, LifecycleError};
use crate::events::PoolEvent;
use crate::framework::AccountRef;

/// Dissolve an open pool, or retry the refund legs of a dissolved one.
///
/// When `initiator` is set it must be the pool creator; trusted callers
/// may omit it. Only open pools dissolve on request - active pools reach
/// dissolution solely through the engine's own forced paths. Invoking
/// this on an already-dissolved pool is the refund-retry replay and
/// succeeds idempotently.
#[derive(Debug, Clone)]
pub struct DissolvePool {
    pub pool_id: PoolId,
    pub initiator: Option<WalletAddress>,
    pub reason: Option<String>,
}

/// Terminal state of a dissolved pool, including refund progress.
#[derive(Debug, Clone)]
pub struct DissolutionOutcome {
    pub pool: PoolRecord,
    pub refunds: Vec<RefundEntry>,
}

impl Processor<DissolvePool> for SusuEngine {
    type Output = DissolutionOutcome;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:DissolvePool")]
    async fn process(&self, command: DissolvePool) -> Result<DissolutionOutcome, EngineError> {
        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;

        match aggregate.pool.status {
            // Replay: retry any refund legs still outstanding.
            PoolStatus::Dissolved => {
                self.run_refunds(&mut aggregate).await;
            }
            PoolStatus::Open => {
                if let Some(initiator) = &command.initiator {
                    if initiator != &aggregate.pool.creator {
                        return Err(LifecycleError::NotCreator {
                            wallet: initiator.clone(),
                        }
                        .into());
                    }
                }
                self.dissolve_locked(
                    &mut aggregate,
                    DissolutionReason::CreatorCancelled {
                        reason: command.reason,
                    },
                )
                .await?;
                tracing::info!(pool_id = %command.pool_id, "pool dissolved by creator");
            }
            status => {
                return Err(LifecycleError::DissolveRefused { status }.into());
            }
        }

        Ok(DissolutionOutcome {
            pool: aggregate.pool.clone(),
            refunds: aggregate.refunds.clone(),
        })
    }
}

impl SusuEngine {
    /// Commit a dissolution on a locked aggregate: transition, record the
    /// reason, queue refunds for the unsettled cycle's contributions, then
    /// attempt the refund legs.
    ///
    /// Contributions from members who exited stay in escrow; they were
    /// forfeited. Fee accruals already recorded stay with the treasury.
    pub(crate) async fn dissolve_locked(
        &self,
        aggregate: &mut PoolAggregate,
        reason: DissolutionReason,
    ) -> Result<(), LifecycleError> {
        aggregate.transition(PoolStatus::Dissolved)?;
        aggregate.pool.dissolution_reason = Some(reason.clone());

        let mut owed: Vec<RefundEntry> = Vec::new();
        if let Some(cycle) = aggregate.cycles.get(aggregate.pool.current_cycle as usize) {
            if !cycle.is_settled() {
                for entry in &cycle.contributions {
                    let participating = aggregate
                        .member(&entry.wallet)
                        .is_some_and(|m| m.status.is_participating());
                    if participating {
                        owed.push(RefundEntry {
                            wallet: entry.wallet.clone(),
                            amount: entry.amount,
                            completed: false,
                        });
                    }
                }
            }
        }
        aggregate.refunds.extend(owed);

        self.emit(PoolEvent::PoolDissolved {
            pool_id: aggregate.pool.pool_id,
            reason,
        });
        self.run_refunds(aggregate).await;
        Ok(())
    }

    /// Attempt every outstanding refund leg. A failed leg is logged and
    /// left incomplete for the next retry; it never fails the dissolution.
    pub(crate) async fn run_refunds(&self, aggregate: &mut PoolAggregate) {
        let pool_id = aggregate.pool.pool_id;
        let token = aggregate.pool.token.clone();
        let escrow = AccountRef::PoolEscrow(pool_id);

        for refund in aggregate.refunds.iter_mut().filter(|r| !r.completed) {
            let to = AccountRef::Wallet(refund.wallet.clone());
            match self
                .inner
                .ledger
                .transfer(&token, &escrow, &to, refund.amount)
                .await
            {
                Ok(()) => refund.completed = true,
                Err(error) => {
                    tracing::warn!(
                        %pool_id,
                        wallet = %refund.wallet,
                        %error,
                        "refund leg failed; outstanding until the next dissolve call"
                    );
                }
            }
        }
    }
}
