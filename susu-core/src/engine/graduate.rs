//! Hub directory and graduation.
//!
//! Hubs group graduates of completed pools for discovery. A graduation is
//! a recorded edge only; it never moves funds.

use kanau::processor::Processor;
use susu_sdk::objects::{HubId, PoolId, WalletAddress};

use super::SusuEngine;
use crate::entities::{GraduationRecord, HubKind, HubRecord, MemberStatus, PoolStatus};
use crate::errors::{EngineError, GraduationError};
use crate::events::PoolEvent;

/// Register a hub in the directory. Idempotent on the hub id: a hub that
/// already exists is returned unchanged.
#[derive(Debug, Clone)]
pub struct RegisterHub {
    pub hub_id: HubId,
    pub name: String,
    pub kind: HubKind,
    pub description: Option<String>,
}

impl Processor<RegisterHub> for SusuEngine {
    type Output = HubRecord;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:RegisterHub")]
    async fn process(&self, command: RegisterHub) -> Result<HubRecord, EngineError> {
        let mut hubs = self.inner.hubs.write().await;
        if let Some(existing) = hubs.get(&command.hub_id) {
            return Ok(existing.clone());
        }

        let hub = HubRecord {
            hub_id: command.hub_id.clone(),
            name: command.name,
            kind: command.kind,
            description: command.description,
            active: true,
            created_at: self.now(),
        };
        hubs.insert(command.hub_id, hub.clone());
        Ok(hub)
    }
}

/// Graduate a member of a completed pool into a hub.
///
/// Eligibility: the source pool is completed, the member finished in
/// `Active` standing (or already graduated elsewhere), and they never
/// missed a cycle. The same (wallet, pool, hub) edge is recorded once.
#[derive(Debug, Clone)]
pub struct Graduate {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
    pub hub_id: HubId,
}

impl Processor<Graduate> for SusuEngine {
    type Output = GraduationRecord;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:Graduate")]
    async fn process(&self, command: Graduate) -> Result<GraduationRecord, EngineError> {
        {
            let hubs = self.inner.hubs.read().await;
            match hubs.get(&command.hub_id) {
                None => {
                    return Err(GraduationError::UnknownHub {
                        hub_id: command.hub_id,
                    }
                    .into());
                }
                Some(hub) if !hub.active => {
                    return Err(GraduationError::HubInactive {
                        hub_id: command.hub_id,
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;

        if aggregate.pool.status != PoolStatus::Completed {
            return Err(GraduationError::PoolNotCompleted {
                pool_id: command.pool_id,
            }
            .into());
        }
        let Some(member) = aggregate.member(&command.wallet) else {
            return Err(GraduationError::NotEligible {
                wallet: command.wallet,
            }
            .into());
        };
        let eligible_status =
            matches!(member.status, MemberStatus::Active | MemberStatus::Graduated);
        if !eligible_status || member.cycles_missed > 0 {
            return Err(GraduationError::NotEligible {
                wallet: command.wallet,
            }
            .into());
        }

        let record = GraduationRecord {
            wallet: command.wallet.clone(),
            source_pool: command.pool_id,
            hub_id: command.hub_id.clone(),
            recorded_at: self.now(),
        };
        {
            let mut graduations = self.inner.graduations.write().await;
            let duplicate = graduations.iter().any(|g| {
                g.wallet == command.wallet
                    && g.source_pool == command.pool_id
                    && g.hub_id == command.hub_id
            });
            if duplicate {
                return Err(GraduationError::AlreadyGraduated {
                    wallet: command.wallet,
                    pool_id: command.pool_id,
                    hub_id: command.hub_id,
                }
                .into());
            }
            graduations.push(record.clone());
        }
        if let Some(member) = aggregate.member_mut(&command.wallet) {
            member.status = MemberStatus::Graduated;
        }
        drop(aggregate);

        self.emit(PoolEvent::MemberGraduated {
            pool_id: command.pool_id,
            wallet: command.wallet,
            hub_id: command.hub_id,
        });
        Ok(record)
    }
}
