//! Shared wire objects for all Susu APIs.

pub mod cycles;
pub mod error;
pub mod hubs;
pub mod ids;
pub mod members;
pub mod pools;
pub mod treasury;

pub use cycles::{
    ContributeRequest, ContributionRecordedResponse, ContributionResponse, CycleResponse,
    SettleCycleRequest, SettlementResponse,
};
pub use error::ApiErrorPayload;
pub use hubs::{
    GraduateRequest, GraduationResponse, HubKind, HubResponse, RegisterHubRequest,
};
pub use ids::{HubId, PoolId, TokenRef, WalletAddress};
pub use members::{
    ExitPoolRequest, InviteMemberRequest, JoinPoolRequest, MemberPoolsResponse, MemberResponse,
    MemberStatus,
};
pub use pools::{
    ActivatePoolRequest, ActivationResponse, AdmissionMode, CreatePoolRequest,
    DissolutionResponse, DissolvePoolRequest, EngineLimitsResponse, ExpectedPayoutResponse,
    PayoutOrderResponse, PoolResponse, PoolStatus, RefundResponse, RotationMode,
};
pub use treasury::{TreasuryBalanceResponse, TreasuryEntryResponse, TreasuryResponse};
