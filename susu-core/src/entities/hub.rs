//! Hub directory records and graduation edges.

use serde::{Deserialize, Serialize};
use susu_sdk::objects::hubs::HubKind as SdkHubKind;
use susu_sdk::objects::{HubId, PoolId, WalletAddress};
use time::OffsetDateTime;

/// What a hub groups members by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubKind {
    Region,
    Purpose,
}

impl From<SdkHubKind> for HubKind {
    fn from(value: SdkHubKind) -> Self {
        match value {
            SdkHubKind::Region => HubKind::Region,
            SdkHubKind::Purpose => HubKind::Purpose,
        }
    }
}

impl From<HubKind> for SdkHubKind {
    fn from(value: HubKind) -> Self {
        match value {
            HubKind::Region => SdkHubKind::Region,
            HubKind::Purpose => SdkHubKind::Purpose,
        }
    }
}

/// A directory hub. Carries no funds; it only groups graduates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubRecord {
    pub hub_id: HubId,
    pub name: String,
    pub kind: HubKind,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: OffsetDateTime,
}

/// A directed graduation edge: wallet × completed pool × hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationRecord {
    pub wallet: WalletAddress,
    pub source_pool: PoolId,
    pub hub_id: HubId,
    pub recorded_at: OffsetDateTime,
}
