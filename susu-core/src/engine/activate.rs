//! Pool activation: the `Open -> Active` transition.

use kanau::processor::Processor;
use susu_sdk::objects::{PoolId, WalletAddress};

use super::{PayoutOrder, SusuEngine};
use crate::entities::{
    CycleRecord, DissolutionReason, MemberStatus, PoolRecord, PoolStatus, RotationMode,
};
use crate::errors::{EngineError, LifecycleError};
use crate::events::PoolEvent;
use crate::rotation;

/// Activate a full pool once its start time has been reached. Anyone may
/// invoke this; the engine never activates on its own.
#[derive(Debug, Clone)]
pub struct ActivatePool {
    pub pool_id: PoolId,
}

/// Result of a successful activation.
#[derive(Debug, Clone)]
pub struct ActivationOutcome {
    pub pool: PoolRecord,
    /// Payout order fixed at this activation, first payee first.
    pub payout_order: Vec<WalletAddress>,
    /// Activation entropy for randomized pools, stored for audit.
    pub seed: Option<[u8; 32]>,
}

impl Processor<ActivatePool> for SusuEngine {
    type Output = ActivationOutcome;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:ActivatePool")]
    async fn process(&self, command: ActivatePool) -> Result<ActivationOutcome, EngineError> {
        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;
        let now = self.now();

        if aggregate.pool.status != PoolStatus::Open {
            return Err(LifecycleError::InvalidTransition {
                from: aggregate.pool.status,
                attempted: PoolStatus::Active,
            }
            .into());
        }
        if now < aggregate.pool.starts_at {
            return Err(LifecycleError::StartTimeNotReached {
                starts_at: aggregate.pool.starts_at,
            }
            .into());
        }

        let members = aggregate.member_count();
        let capacity = aggregate.pool.capacity;
        if members < capacity {
            // An underfull pool past its activation window dissolves
            // instead of lingering open forever.
            if now > aggregate.pool.starts_at + self.config().activation_grace {
                self.dissolve_locked(&mut aggregate, DissolutionReason::ActivationExpired)
                    .await?;
                return Err(LifecycleError::ActivationExpired.into());
            }
            return Err(LifecycleError::ActivationNotReady { members, capacity }.into());
        }

        // Fix the payout order. Fixed rotation follows the join order;
        // randomized rotation shuffles it with seeded entropy captured
        // here and stored so the permutation stays auditable.
        let mut sequences: Vec<u32> = aggregate.members.iter().map(|m| m.join_sequence).collect();
        sequences.sort_unstable();
        let order = match aggregate.pool.rotation_mode {
            RotationMode::Fixed => PayoutOrder {
                seed: None,
                positions: sequences,
            },
            RotationMode::Randomized => {
                let entropy = self.inner.seeds.activation_entropy();
                let seed = rotation::derive_seed(&entropy, command.pool_id);
                PayoutOrder {
                    seed: Some(entropy),
                    positions: rotation::randomized_order(&seed, &sequences),
                }
            }
        };

        aggregate.transition(PoolStatus::Active)?;
        aggregate.pool.activated_at = Some(now);
        aggregate.payout_order = Some(order);
        for member in aggregate.members.iter_mut() {
            if member.status == MemberStatus::Pending {
                member.status = MemberStatus::Active;
            }
        }
        let cycle_duration = aggregate.pool.cycle_duration;
        let grace_period = aggregate.pool.grace_period;
        aggregate.cycles.push(CycleRecord::open(
            command.pool_id,
            0,
            now,
            cycle_duration,
            grace_period,
        ));

        let outcome = ActivationOutcome {
            pool: aggregate.pool.clone(),
            payout_order: aggregate.payout_wallets(),
            seed: aggregate.payout_order.as_ref().and_then(|o| o.seed),
        };
        drop(aggregate);

        tracing::info!(pool_id = %command.pool_id, "pool activated");
        self.emit(PoolEvent::PoolActivated {
            pool_id: command.pool_id,
            payout_order: outcome.payout_order.clone(),
        });
        Ok(outcome)
    }
}
