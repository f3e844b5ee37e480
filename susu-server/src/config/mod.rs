//! Configuration module for susu-server.
//!
//! Handles loading configuration from TOML files and CLI arguments.
//! Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::{
    EngineConfig as FileEngineConfig, FileConfig, HubConfig, OperatorConfig as FileOperatorConfig,
};
use crate::config::runtime::{AdminConfig, OperatorConfig, ServerConfig, SharedConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use susu_core::config::EngineConfig;
use thiserror::Error;
use time::Duration;
use tokio::sync::RwLock;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub operator: OperatorConfig,
    pub engine: EngineConfig,
    pub hubs: Vec<HubConfig>,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    ///
    /// The engine limits and hub seed list are not part of the shared
    /// config: limits are fixed at engine construction, and hubs are
    /// registered with the engine directly.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            admin: Arc::new(RwLock::new(self.admin)),
            operator: Arc::new(RwLock::new(self.operator)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        // Read the config file
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        // Apply CLI overrides
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        // Validate the configuration
        self.validate(&file_config)?;

        // Hash admin secret if needed and rewrite config
        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = self.hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        // Build the config parts
        Ok(self.build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    ///
    /// Returns a LoadedConfig that can be used to update individual parts
    /// of a SharedConfig.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.operator.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "operator secret must not be empty".to_string(),
            ));
        }
        for hub in &config.hubs {
            if hub.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "hub {} has an empty name",
                    hub.hub_id
                )));
            }
        }
        convert_engine(&config.engine)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }

    fn hash_secret(&self, plaintext: &str) -> Result<String, ConfigError> {
        use argon2::{
            Argon2, PasswordHasher,
            password_hash::{SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ConfigError::HashError(e.to_string()))
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }

    fn build_loaded_config(&self, file_config: FileConfig, secret_hash: String) -> LoadedConfig {
        LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            admin: AdminConfig::new(secret_hash),
            operator: convert_operator(file_config.operator),
            engine: convert_engine(&file_config.engine),
            hubs: file_config.hubs,
        }
    }
}

fn convert_operator(o: FileOperatorConfig) -> OperatorConfig {
    OperatorConfig::new(o.name, o.secret.into_bytes().into_boxed_slice())
}

fn convert_engine(e: &FileEngineConfig) -> EngineConfig {
    EngineConfig {
        max_fee_bps: e.max_fee_bps,
        max_late_fee_bps: e.max_late_fee_bps,
        default_grace_period: Duration::seconds(e.default_grace_period_secs as i64),
        default_late_fee_bps: e.default_late_fee_bps,
        missed_cycle_threshold: e.missed_cycle_threshold,
        activation_grace: Duration::seconds(e.activation_grace_secs as i64),
    }
}
