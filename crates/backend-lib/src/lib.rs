// ============================
// backend-lib/src/lib.rs
// ============================
//! Core library for the `passgate` authentication server.

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod validation;

use std::sync::Arc;

use tracing::info;

use crate::auth::{AuthService, DefaultAuth, PasswordHasher, TokenIssuer};
use crate::config::{ConfigError, Settings};
use crate::directory::{FlatFileDirectory, InMemoryDirectory, UserDirectory};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create application state over an existing directory
    pub fn new(directory: Arc<dyn UserDirectory>, config: &Settings) -> Result<Self, ConfigError> {
        config.validate()?;

        let hasher = PasswordHasher::new(config.hashing)?;
        hasher
            .warm_up()
            .map_err(|e| ConfigError::Hashing(e.to_string()))?;
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl())?;
        let auth = DefaultAuth::new(directory, hasher, tokens)
            .with_requirements(config.password_requirements.clone())
            .with_policy(config.auth.registration_policy());

        Ok(Self {
            auth: Arc::new(auth),
            settings: Arc::new(config.clone()),
        })
    }

    /// Create application state with the directory selected by `config`:
    /// flat files under `data_dir` when set, memory otherwise.
    pub fn from_settings(config: &Settings) -> anyhow::Result<Self> {
        let directory: Arc<dyn UserDirectory> = match &config.data_dir {
            Some(dir) => Arc::new(FlatFileDirectory::open(dir)?),
            None => {
                info!("no data_dir configured, users are kept in memory");
                Arc::new(InMemoryDirectory::new())
            }
        };
        Ok(Self::new(directory, config)?)
    }
}
