//! Event type definitions.
//!
//! Events are emitted after a transition commits. They are ephemeral and
//! carry identifiers plus the amounts involved; subscribers needing full
//! state query the engine.

use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{HubId, PoolId, WalletAddress};
use uuid::Uuid;

use crate::entities::DissolutionReason;

/// Everything that can happen to a pool, in commit order.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    PoolCreated {
        pool_id: PoolId,
        creator: WalletAddress,
    },
    MemberJoined {
        pool_id: PoolId,
        wallet: WalletAddress,
        join_sequence: u32,
    },
    MemberExited {
        pool_id: PoolId,
        wallet: WalletAddress,
    },
    PoolActivated {
        pool_id: PoolId,
        /// Payout order fixed at activation, first payee first.
        payout_order: Vec<WalletAddress>,
    },
    ContributionRecorded {
        pool_id: PoolId,
        cycle: u32,
        wallet: WalletAddress,
        amount: TokenAmount,
        /// `true` once every active member has contributed.
        cycle_ready: bool,
    },
    MemberDefaulted {
        pool_id: PoolId,
        wallet: WalletAddress,
        cycles_missed: u32,
    },
    CycleSettled {
        pool_id: PoolId,
        cycle: u32,
        receipt_id: Uuid,
        payee: WalletAddress,
        disbursed: TokenAmount,
        fee: TokenAmount,
    },
    PoolCompleted {
        pool_id: PoolId,
    },
    PoolDissolved {
        pool_id: PoolId,
        reason: DissolutionReason,
    },
    MemberGraduated {
        pool_id: PoolId,
        wallet: WalletAddress,
        hub_id: HubId,
    },
}

impl PoolEvent {
    /// The pool this event belongs to.
    pub fn pool_id(&self) -> PoolId {
        match self {
            PoolEvent::PoolCreated { pool_id, .. }
            | PoolEvent::MemberJoined { pool_id, .. }
            | PoolEvent::MemberExited { pool_id, .. }
            | PoolEvent::PoolActivated { pool_id, .. }
            | PoolEvent::ContributionRecorded { pool_id, .. }
            | PoolEvent::MemberDefaulted { pool_id, .. }
            | PoolEvent::CycleSettled { pool_id, .. }
            | PoolEvent::PoolCompleted { pool_id }
            | PoolEvent::PoolDissolved { pool_id, .. }
            | PoolEvent::MemberGraduated { pool_id, .. } => *pool_id,
        }
    }
}
