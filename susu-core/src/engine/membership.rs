//! Membership admission and exit.

use kanau::processor::Processor;
use susu_sdk::objects::{PoolId, WalletAddress};

use super::SusuEngine;
use crate::entities::{AdmissionMode, MemberRecord, MemberStatus, PoolStatus};
use crate::errors::{AdmissionError, EngineError, LifecycleError};
use crate::events::PoolEvent;

/// Put a wallet on an invite-mode pool's guest list. Creator only.
#[derive(Debug, Clone)]
pub struct InviteMember {
    pub pool_id: PoolId,
    pub creator: WalletAddress,
    pub wallet: WalletAddress,
}

impl Processor<InviteMember> for SusuEngine {
    type Output = ();
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:InviteMember")]
    async fn process(&self, command: InviteMember) -> Result<(), EngineError> {
        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;

        if aggregate.pool.status != PoolStatus::Open {
            return Err(AdmissionError::AdmissionClosed.into());
        }
        if aggregate.pool.creator != command.creator {
            return Err(LifecycleError::NotCreator {
                wallet: command.creator,
            }
            .into());
        }

        aggregate.invites.insert(command.wallet);
        Ok(())
    }
}

/// Join an open pool.
///
/// The capacity check comes first: a full pool refuses everyone with
/// `CapacityExceeded`, whatever the admission mode or the wallet's
/// standing.
#[derive(Debug, Clone)]
pub struct JoinPool {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
}

impl Processor<JoinPool> for SusuEngine {
    type Output = MemberRecord;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:JoinPool")]
    async fn process(&self, command: JoinPool) -> Result<MemberRecord, EngineError> {
        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;

        if aggregate.pool.status != PoolStatus::Open {
            return Err(AdmissionError::AdmissionClosed.into());
        }
        if aggregate.member_count() == aggregate.pool.capacity {
            return Err(AdmissionError::CapacityExceeded {
                capacity: aggregate.pool.capacity,
            }
            .into());
        }
        if aggregate.member(&command.wallet).is_some() {
            return Err(AdmissionError::AlreadyMember {
                wallet: command.wallet,
            }
            .into());
        }
        if aggregate.pool.admission_mode == AdmissionMode::Invite
            && !aggregate.invites.contains(&command.wallet)
        {
            return Err(AdmissionError::NotInvited {
                wallet: command.wallet,
            }
            .into());
        }

        let sequence = aggregate.allocate_join_sequence();
        let member = MemberRecord::new(
            command.pool_id,
            command.wallet.clone(),
            sequence,
            self.now(),
        );
        aggregate.members.push(member.clone());
        drop(aggregate);

        self.index_wallet(&command.wallet, command.pool_id).await;
        self.emit(PoolEvent::MemberJoined {
            pool_id: command.pool_id,
            wallet: command.wallet,
            join_sequence: sequence,
        });
        Ok(member)
    }
}

/// Leave a pool.
///
/// While the pool is open the seat reopens and the member record is
/// dropped; the join sequence is not reused. While the pool is active the
/// member is marked `Exited`: contributions already made stay in the pot
/// and no refund is owed.
#[derive(Debug, Clone)]
pub struct ExitPool {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
}

impl Processor<ExitPool> for SusuEngine {
    type Output = MemberRecord;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:ExitPool")]
    async fn process(&self, command: ExitPool) -> Result<MemberRecord, EngineError> {
        let aggregate = self.aggregate(command.pool_id).await?;
        let mut aggregate = aggregate.lock().await;

        let Some(member) = aggregate.member(&command.wallet) else {
            return Err(LifecycleError::NotAMember {
                wallet: command.wallet,
            }
            .into());
        };
        let status = member.status;

        match aggregate.pool.status {
            PoolStatus::Open => {
                let mut removed = match aggregate
                    .members
                    .iter()
                    .position(|m| m.wallet == command.wallet)
                {
                    Some(position) => aggregate.members.remove(position),
                    None => {
                        return Err(LifecycleError::NotAMember {
                            wallet: command.wallet,
                        }
                        .into());
                    }
                };
                removed.status = MemberStatus::Exited;
                drop(aggregate);

                self.unindex_wallet(&command.wallet, command.pool_id).await;
                self.emit(PoolEvent::MemberExited {
                    pool_id: command.pool_id,
                    wallet: command.wallet,
                });
                Ok(removed)
            }
            PoolStatus::Active => {
                if !status.is_participating() {
                    return Err(LifecycleError::ExitRefused {
                        wallet: command.wallet,
                        status,
                    }
                    .into());
                }
                let snapshot = match aggregate.member_mut(&command.wallet) {
                    Some(member) => {
                        member.status = MemberStatus::Exited;
                        member.clone()
                    }
                    None => {
                        return Err(LifecycleError::NotAMember {
                            wallet: command.wallet,
                        }
                        .into());
                    }
                };
                drop(aggregate);

                self.emit(PoolEvent::MemberExited {
                    pool_id: command.pool_id,
                    wallet: command.wallet,
                });
                Ok(snapshot)
            }
            _ => Err(LifecycleError::ExitRefused {
                wallet: command.wallet,
                status,
            }
            .into()),
        }
    }
}
