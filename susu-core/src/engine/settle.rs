//! Cycle settlement.
//!
//! Settlement is caller-triggered and idempotent: anyone may invoke it
//! once the cycle is ready, and replaying a settled cycle returns the
//! stored receipt without a second transfer.

use kanau::processor::Processor;
use susu_sdk::objects::PoolId;
use uuid::Uuid;

use super::SusuEngine;
use crate::entities::{CycleRecord, DissolutionReason, MemberStatus, PoolStatus, SettlementReceipt};
use crate::errors::{EngineError, SettlementError};
use crate::events::PoolEvent;
use crate::fees;
use crate::framework::AccountRef;
use crate::rotation;

/// Settle one cycle: disburse the pot to the resolved payee and advance
/// the pool.
///
/// A cycle is ready once every participating member has contributed, or
/// once its grace deadline has passed - in which case non-contributors
/// are marked missed (and defaulted past the configured threshold) before
/// the payee is resolved. `NoEligiblePayee` is the one error that changes
/// state: it commits the forced dissolution before returning.
#[derive(Debug, Clone)]
pub struct SettleCycle {
    pub pool_id: PoolId,
    pub cycle: u32,
}

impl Processor<SettleCycle> for SusuEngine {
    type Output = SettlementReceipt;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:SettleCycle")]
    async fn process(&self, command: SettleCycle) -> Result<SettlementReceipt, EngineError> {
        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;
        let now = self.now();

        // Replay: a settled cycle returns its stored receipt, whatever
        // state the pool has since reached.
        if let Some(receipt) = aggregate
            .cycles
            .get(command.cycle as usize)
            .and_then(|c| c.settlement.clone())
        {
            return Ok(receipt);
        }

        if aggregate.pool.status != PoolStatus::Active {
            return Err(SettlementError::PoolNotActive.into());
        }
        let participating = aggregate
            .members
            .iter()
            .filter(|m| m.status.is_participating())
            .count() as u32;
        if command.cycle != aggregate.pool.current_cycle {
            // Earlier cycles replayed above; later ones have not opened.
            return Err(SettlementError::CycleNotReady {
                waiting_on: participating,
            }
            .into());
        }

        let (pot, grace_deadline) = match aggregate.current_cycle() {
            Some(cycle) => (cycle.pot, cycle.grace_deadline),
            None => {
                return Err(SettlementError::PoolNotActive.into());
            }
        };
        let waiting = aggregate.waiting_on();
        if !waiting.is_empty() && now <= grace_deadline {
            return Err(SettlementError::CycleNotReady {
                waiting_on: waiting.len() as u32,
            }
            .into());
        }

        // Stage the miss marks on a copy so a failed transfer commits
        // nothing. Payee resolution runs against the staged view: a
        // member defaulting at this settlement is already skipped.
        let threshold = self.config().missed_cycle_threshold;
        let mut staged = aggregate.members.clone();
        let mut defaulted = Vec::new();
        for member in staged.iter_mut() {
            if waiting.contains(&member.wallet) {
                member.cycles_missed += 1;
                if member.status != MemberStatus::Defaulted && member.cycles_missed > threshold {
                    member.status = MemberStatus::Defaulted;
                    defaulted.push((member.wallet.clone(), member.cycles_missed));
                }
            }
        }

        let Some(order) = aggregate.payout_order.as_ref() else {
            return Err(SettlementError::PoolNotActive.into());
        };
        let Some(payee) = rotation::resolve_payee(&order.positions, &staged).cloned() else {
            // Every remaining candidate is gone. The miss marks are
            // real, so commit them along with the forced dissolution.
            aggregate.members = staged;
            if let Some(cycle) = aggregate.cycles.get_mut(command.cycle as usize) {
                cycle.missed = waiting.clone();
            }
            for (wallet, cycles_missed) in defaulted {
                self.emit(PoolEvent::MemberDefaulted {
                    pool_id: command.pool_id,
                    wallet,
                    cycles_missed,
                });
            }
            self.dissolve_locked(&mut aggregate, DissolutionReason::NoEligiblePayee)
                .await?;
            tracing::warn!(pool_id = %command.pool_id, cycle = command.cycle, "no eligible payee; pool dissolved");
            return Err(SettlementError::NoEligiblePayee.into());
        };

        let split = fees::split_fee(pot, aggregate.pool.fee_bps);

        // The single fallible step: pot minus fee leaves escrow for the
        // payee. Fee tokens stay escrowed; the treasury records the
        // accrual below.
        self.inner
            .ledger
            .transfer(
                &aggregate.pool.token,
                &AccountRef::PoolEscrow(command.pool_id),
                &AccountRef::Wallet(payee.wallet.clone()),
                split.net,
            )
            .await?;

        let receipt = SettlementReceipt {
            receipt_id: Uuid::now_v7(),
            pool_id: command.pool_id,
            cycle_index: command.cycle,
            payee: payee.wallet.clone(),
            pot,
            fee: split.fee,
            disbursed: split.net,
            settled_at: now,
        };

        aggregate.members = staged;
        if let Some(cycle) = aggregate.cycles.get_mut(command.cycle as usize) {
            cycle.missed = waiting;
            cycle.payee = Some(payee.wallet.clone());
            cycle.settlement = Some(receipt.clone());
        }
        if let Some(member) = aggregate.member_mut(&payee.wallet) {
            member.has_received_payout = true;
            member.total_received = member.total_received.saturating_add(split.net);
        }
        aggregate.pool.total_disbursed = aggregate.pool.total_disbursed.saturating_add(split.net);
        aggregate.pool.total_fees_accrued =
            aggregate.pool.total_fees_accrued.saturating_add(split.fee);
        aggregate.pool.current_cycle += 1;

        let token = aggregate.pool.token.clone();
        let completed = aggregate.pool.current_cycle == aggregate.pool.total_cycles();
        if completed {
            aggregate.transition(PoolStatus::Completed)?;
        } else {
            let current_cycle = aggregate.pool.current_cycle;
            let cycle_duration = aggregate.pool.cycle_duration;
            let grace_period = aggregate.pool.grace_period;
            aggregate.cycles.push(CycleRecord::open(
                command.pool_id,
                current_cycle,
                now,
                cycle_duration,
                grace_period,
            ));
        }
        drop(aggregate);

        self.inner
            .treasury
            .accrue(command.pool_id, command.cycle, token, split.fee, now)
            .await;

        for (wallet, cycles_missed) in defaulted {
            self.emit(PoolEvent::MemberDefaulted {
                pool_id: command.pool_id,
                wallet,
                cycles_missed,
            });
        }
        tracing::info!(
            pool_id = %command.pool_id,
            cycle = command.cycle,
            payee = %receipt.payee,
            disbursed = %receipt.disbursed,
            fee = %receipt.fee,
            "cycle settled"
        );
        self.emit(PoolEvent::CycleSettled {
            pool_id: command.pool_id,
            cycle: command.cycle,
            receipt_id: receipt.receipt_id,
            payee: receipt.payee.clone(),
            disbursed: receipt.disbursed,
            fee: receipt.fee,
        });
        if completed {
            self.emit(PoolEvent::PoolCompleted {
                pool_id: command.pool_id,
            });
        }
        Ok(receipt)
    }
}
