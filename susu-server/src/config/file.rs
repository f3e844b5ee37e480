//! TOML file configuration structures.
//!
//! These structs directly map to the `susu-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use susu_sdk::objects::HubId;
use susu_sdk::objects::hubs::HubKind;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub operator: OperatorConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub hubs: Vec<HubConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Operator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Human-readable operator name.
    pub name: String,
    /// Secret key for signing API requests.
    pub secret: String,
}

/// Engine limits section. Every field has a default, so the whole table
/// may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound accepted for a pool's protocol fee, in basis points.
    #[serde(default = "default_max_fee_bps")]
    pub max_fee_bps: u16,
    /// Upper bound accepted for a pool's late-contribution surcharge.
    #[serde(default = "default_max_late_fee_bps")]
    pub max_late_fee_bps: u16,
    /// Grace window applied when a pool does not specify one.
    #[serde(default = "default_grace_period_secs")]
    pub default_grace_period_secs: u64,
    /// Late-fee rate applied when a pool does not specify one.
    #[serde(default = "default_late_fee_bps")]
    pub default_late_fee_bps: u16,
    /// A member defaults once their missed-cycle count exceeds this.
    #[serde(default = "default_missed_cycle_threshold")]
    pub missed_cycle_threshold: u32,
    /// How long past its start time an underfull open pool may linger
    /// before activation attempts dissolve it.
    #[serde(default = "default_activation_grace_secs")]
    pub activation_grace_secs: u64,
}

fn default_max_fee_bps() -> u16 {
    1000
}

fn default_max_late_fee_bps() -> u16 {
    500
}

fn default_grace_period_secs() -> u64 {
    86_400
}

fn default_late_fee_bps() -> u16 {
    200
}

fn default_missed_cycle_threshold() -> u32 {
    1
}

fn default_activation_grace_secs() -> u64 {
    604_800
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_fee_bps: default_max_fee_bps(),
            max_late_fee_bps: default_max_late_fee_bps(),
            default_grace_period_secs: default_grace_period_secs(),
            default_late_fee_bps: default_late_fee_bps(),
            missed_cycle_threshold: default_missed_cycle_threshold(),
            activation_grace_secs: default_activation_grace_secs(),
        }
    }
}

/// Hub seed entry. Registered with the engine at startup and on reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Directory slug, e.g. "accra-traders".
    pub hub_id: HubId,
    pub name: String,
    pub kind: HubKind,
    #[serde(default)]
    pub description: Option<String>,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}
