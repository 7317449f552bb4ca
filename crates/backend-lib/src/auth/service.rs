// ============================
// backend-lib/src/auth/service.rs
// ============================
//! Registration, login and token checks on top of a [`UserDirectory`].
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use super::{AuthError, PasswordHasher, TokenIssuer};
use crate::directory::{DirectoryError, User, UserDirectory};
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, TOKEN_REJECTED, USER_REGISTERED};
use crate::validation::{normalize_email, validate_password, PasswordRequirements};

/// What `login` does with an email it has never seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Unknown emails are rejected with [`AuthError::InvalidCredentials`]
    #[default]
    Explicit,
    /// Unknown emails are registered on the spot and logged in
    AutoRegister,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and return its id
    async fn register(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Check credentials and return a signed token
    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Issue a token for an existing user id
    fn issue_token(&self, user_id: &str) -> Result<String, AuthError>;

    /// Verify an `Authorization` header value and return the user id
    fn authenticate(&self, authorization: &str) -> Result<String, AuthError>;

    /// Resolve the user behind a verified token
    async fn current_user(&self, user_id: &str) -> Result<User, AuthError>;

    /// Lifetime of issued tokens
    fn token_ttl(&self) -> Duration;
}

/// Default [`AuthService`] backed by Argon2id and HS256 tokens
pub struct DefaultAuth {
    directory: Arc<dyn UserDirectory>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    requirements: PasswordRequirements,
    policy: RegistrationPolicy,
}

impl DefaultAuth {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            directory,
            hasher,
            tokens,
            requirements: PasswordRequirements::default(),
            policy: RegistrationPolicy::default(),
        }
    }

    pub fn with_requirements(mut self, requirements: PasswordRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Hashing runs on the blocking pool.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    /// Burn one verification against the decoy hash.
    async fn check_decoy(&self, password: &str) {
        let hasher = self.hasher.clone();
        let password = Zeroizing::new(password.to_string());
        match tokio::task::spawn_blocking(move || hasher.verify_decoy(&password)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "decoy verification failed"),
            Err(e) => debug!(error = %e, "decoy verification task failed"),
        }
    }

    async fn check_password(&self, user: &User, password: &str) -> Result<(), AuthError> {
        let hasher = self.hasher.clone();
        let hash = user.password_hash.clone();
        let password = Zeroizing::new(password.to_string());
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        match matches {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(AuthError::MalformedHash) => {
                error!(user_id = %user.id, "stored password hash is malformed");
                Err(AuthError::MalformedHash)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_user(&self, email: String, password: &str) -> Result<User, AuthError> {
        validate_password(password, &self.requirements)?;

        match self.directory.get_by_email(&email).await {
            Ok(_) => return Err(AuthError::Conflict),
            Err(DirectoryError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = self.hash_password(password).await?;
        let user = User::new(email, password_hash);
        self.directory.create(user.clone()).await?;

        counter!(USER_REGISTERED).increment(1);
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = match normalize_email(email) {
            Ok(email) => email,
            Err(e) if self.policy == RegistrationPolicy::AutoRegister => return Err(e.into()),
            Err(_) => return Err(AuthError::InvalidCredentials),
        };
        info!(email = %email, "login");

        let user = match self.directory.get_by_email(&email).await {
            Ok(user) => user,
            Err(DirectoryError::NotFound) if self.policy == RegistrationPolicy::AutoRegister => {
                match self.create_user(email.clone(), password).await {
                    Ok(user) => return self.issue_token(&user.id),
                    // Lost a race with a concurrent registration of the same email.
                    Err(AuthError::Conflict) => self.directory.get_by_email(&email).await?,
                    Err(e) => return Err(e),
                }
            }
            Err(DirectoryError::NotFound) => {
                // Unknown accounts cost the same Argon2 work as a wrong password.
                self.check_decoy(password).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        self.check_password(&user, password).await?;
        self.issue_token(&user.id)
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email)?;
        let user = self.create_user(email, password).await?;
        Ok(user.id)
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        match self.login_inner(email, password).await {
            Ok(token) => {
                counter!(LOGIN_SUCCEEDED).increment(1);
                Ok(token)
            }
            Err(e) => {
                counter!(LOGIN_FAILED).increment(1);
                warn!(error = %e, "login failed");
                Err(e)
            }
        }
    }

    fn issue_token(&self, user_id: &str) -> Result<String, AuthError> {
        self.tokens.issue(user_id)
    }

    fn authenticate(&self, authorization: &str) -> Result<String, AuthError> {
        self.tokens.verify(authorization).inspect_err(|_| {
            counter!(TOKEN_REJECTED).increment(1);
        })
    }

    async fn current_user(&self, user_id: &str) -> Result<User, AuthError> {
        match self.directory.get_by_id(user_id).await {
            Ok(user) => Ok(user),
            // The token is still well-formed, but its subject is gone.
            Err(DirectoryError::NotFound) => Err(AuthError::InvalidToken),
            Err(e) => Err(e.into()),
        }
    }

    fn token_ttl(&self) -> Duration {
        self.tokens.ttl()
    }
}
