//! Cycle contributions.

use kanau::processor::Processor;
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{PoolId, WalletAddress};

use super::SusuEngine;
use crate::entities::{ContributionEntry, PoolStatus};
use crate::errors::{ContributionError, EngineError};
use crate::events::PoolEvent;
use crate::fees;
use crate::framework::AccountRef;

/// Pay into the current cycle.
///
/// The amount must match exactly: the pool's fixed contribution, plus the
/// late surcharge when paying inside the grace window. One ledger transfer
/// (wallet to pool escrow) happens before anything is recorded; if it
/// fails nothing changes.
#[derive(Debug, Clone)]
pub struct Contribute {
    pub pool_id: PoolId,
    pub cycle: u32,
    pub wallet: WalletAddress,
    pub amount: TokenAmount,
}

/// Result of a recorded contribution.
#[derive(Debug, Clone)]
pub struct ContributionOutcome {
    pub entry: ContributionEntry,
    /// Pot accumulated for the cycle so far.
    pub pot: TokenAmount,
    /// Whether every participating member has now paid in.
    pub cycle_ready: bool,
}

impl Processor<Contribute> for SusuEngine {
    type Output = ContributionOutcome;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:Contribute")]
    async fn process(&self, command: Contribute) -> Result<ContributionOutcome, EngineError> {
        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;
        let now = self.now();

        if aggregate.pool.status != PoolStatus::Active {
            return Err(ContributionError::CycleClosed {
                cycle: command.cycle,
            }
            .into());
        }

        let Some(member) = aggregate.member(&command.wallet) else {
            return Err(ContributionError::NotAMember {
                wallet: command.wallet,
            }
            .into());
        };
        if !member.status.is_participating() {
            return Err(ContributionError::MemberNotParticipating {
                wallet: command.wallet,
                status: member.status,
            }
            .into());
        }

        let current = aggregate.pool.current_cycle;
        if command.cycle < current {
            return Err(ContributionError::CycleClosed {
                cycle: command.cycle,
            }
            .into());
        }
        if command.cycle > current {
            return Err(ContributionError::NotCurrentCycle {
                requested: command.cycle,
                current,
            }
            .into());
        }

        let Some(cycle) = aggregate.current_cycle() else {
            return Err(ContributionError::CycleClosed {
                cycle: command.cycle,
            }
            .into());
        };
        if now > cycle.grace_deadline {
            return Err(ContributionError::CycleClosed {
                cycle: command.cycle,
            }
            .into());
        }
        if cycle.has_contributed(&command.wallet) {
            return Err(ContributionError::DuplicateContribution {
                wallet: command.wallet,
                cycle: command.cycle,
            }
            .into());
        }

        let base = aggregate.pool.contribution_amount;
        let late_fee = if now > cycle.deadline {
            fees::split_fee(base, aggregate.pool.late_fee_bps).fee
        } else {
            TokenAmount::ZERO
        };
        let expected = base.saturating_add(late_fee);
        if command.amount != expected {
            return Err(ContributionError::AmountMismatch {
                expected,
                got: command.amount,
            }
            .into());
        }

        // The single fallible step. On error the cycle is untouched.
        self.inner
            .ledger
            .transfer(
                &aggregate.pool.token,
                &AccountRef::Wallet(command.wallet.clone()),
                &AccountRef::PoolEscrow(command.pool_id),
                command.amount,
            )
            .await?;

        let entry = ContributionEntry {
            wallet: command.wallet.clone(),
            amount: command.amount,
            late_fee,
            paid_at: now,
        };
        let pot = match aggregate.cycles.get_mut(current as usize) {
            Some(cycle) => {
                cycle.contributions.push(entry.clone());
                cycle.pot = cycle.pot.saturating_add(command.amount);
                cycle.pot
            }
            None => TokenAmount::ZERO,
        };
        if let Some(member) = aggregate.member_mut(&command.wallet) {
            member.cycles_contributed += 1;
            member.total_contributed = member.total_contributed.saturating_add(command.amount);
            member.late_fees_paid = member.late_fees_paid.saturating_add(late_fee);
        }
        aggregate.pool.total_contributed = aggregate
            .pool
            .total_contributed
            .saturating_add(command.amount);

        let cycle_ready = aggregate.cycle_ready();
        drop(aggregate);

        self.emit(PoolEvent::ContributionRecorded {
            pool_id: command.pool_id,
            cycle: command.cycle,
            wallet: command.wallet,
            amount: command.amount,
            cycle_ready,
        });
        Ok(ContributionOutcome {
            entry,
            pot,
            cycle_ready,
        })
    }
}
