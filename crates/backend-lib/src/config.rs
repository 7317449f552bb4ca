// ============================
// backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{HashParams, PasswordHasher, RegistrationPolicy, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};
use crate::validation::PasswordRequirements;

/// Config file looked up when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "passgate.toml";

/// Prefix for environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "PASSGATE_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("token signing secret is required")]
    MissingSecret,

    #[error("invalid hashing parameters: {0}")]
    Hashing(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level, used when `RUST_LOG` is not set
    pub log_level: String,
    /// Directory for the flat-file user store; users are kept in memory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Token settings
    pub auth: AuthSettings,
    /// Argon2id cost parameters
    pub hashing: HashParams,
    /// Password requirements for new accounts
    pub password_requirements: PasswordRequirements,
}

/// Token and login settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Register unknown emails on login instead of rejecting them
    pub auto_register: bool,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("auto_register", &self.auto_register)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: "info".to_string(),
            data_dir: None,
            auth: AuthSettings::default(),
            hashing: HashParams::default(),
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL.as_secs(),
            auto_register: false,
        }
    }
}

impl AuthSettings {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn registration_policy(&self) -> RegistrationPolicy {
        if self.auto_register {
            RegistrationPolicy::AutoRegister
        } else {
            RegistrationPolicy::Explicit
        }
    }
}

impl Settings {
    /// Load from `passgate.toml` (if present) and `PASSGATE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(Path::new(DEFAULT_CONFIG_FILE)))
    }

    /// Load from an explicit config file plus `PASSGATE_*` variables.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Invalid(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Self::from_figment(Self::figment(path))
    }

    /// Defaults, then the TOML file, then the environment.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings are usable before anything is built from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.token_ttl() > MAX_TOKEN_TTL {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_secs must not exceed {}",
                MAX_TOKEN_TTL.as_secs()
            )));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level {:?}",
                self.log_level
            )));
        }

        if self.password_requirements.min_length == 0 {
            return Err(ConfigError::Invalid(
                "password_requirements.min_length must be positive".to_string(),
            ));
        }

        PasswordHasher::new(self.hashing)?;
        Ok(())
    }
}
