//! Hub directory and graduation types.

use serde::{Deserialize, Serialize};

use super::ids::{HubId, PoolId, WalletAddress};
use crate::signature::Signature;

/// What a hub groups members by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubKind {
    /// Geographic community (state, city, diaspora).
    Region,
    /// Shared savings purpose (education, trade capital, ...).
    Purpose,
}

/// Request body for `POST /api/v1/admin/hubs` — register a hub. The admin
/// API authenticates with the `Susu-Admin-Authorization` header, so this
/// body is plain JSON rather than a signed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterHubRequest {
    pub hub_id: HubId,
    pub name: String,
    pub kind: HubKind,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for `POST /graduations` — record a member's graduation from
/// a completed pool into a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduateRequest {
    pub pool_id: PoolId,
    pub wallet: WalletAddress,
    pub hub_id: HubId,
}

impl Signature for GraduateRequest {}

/// A hub as returned by the read APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubResponse {
    pub hub_id: HubId,
    pub name: String,
    pub kind: HubKind,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: i64,
    pub graduate_count: u32,
}

/// A recorded graduation edge. Carries no funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationResponse {
    pub wallet: WalletAddress,
    pub source_pool: PoolId,
    pub hub_id: HubId,
    pub recorded_at: i64,
}
