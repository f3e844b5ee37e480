//! Engine-side records.
//!
//! These are the engine's authoritative state types. Wire DTOs live in
//! `susu_sdk::objects`; conversions happen at the API boundary.

pub mod cycle;
pub mod hub;
pub mod member;
pub mod pool;

pub use cycle::{ContributionEntry, CycleRecord, SettlementReceipt};
pub use hub::{GraduationRecord, HubKind, HubRecord};
pub use member::{MemberRecord, MemberStatus};
pub use pool::{
    AdmissionMode, DissolutionReason, FEE_CAP_BPS, MAX_CAPACITY, MIN_CAPACITY, PoolRecord,
    PoolStatus, RotationMode,
};
