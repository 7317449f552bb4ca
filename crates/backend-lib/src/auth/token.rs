// ============================
// backend-lib/src/auth/token.rs
// ============================
//! Stateless bearer tokens.
//!
//! Tokens are HS256 JWTs carrying `sub`, `iat` and `exp`. Nothing is stored
//! server side: a token is valid when its signature checks out against the
//! configured secret and `exp` has not passed. There is no leeway for clock
//! skew between issuer and verifier.
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;
use crate::config::ConfigError;

/// Token lifetime used when none is configured
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Longest lifetime a token may be issued with
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// The only signing algorithm accepted on verification
const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Issues and verifies signed bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer for `secret`. An empty secret is a configuration error.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if ttl.is_zero() {
            return Err(ConfigError::Invalid("token ttl must be positive".to_string()));
        }
        if ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::Invalid(format!(
                "token ttl must not exceed {} seconds",
                MAX_TOKEN_TTL.as_secs()
            )));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Lifetime of newly issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user_id`, valid from now until now + ttl.
    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| AuthError::Signing("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp,
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims with the configured secret.
    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify an `Authorization` header value (or a bare token) and return
    /// the user id it was issued for.
    pub fn verify(&self, authorization: &str) -> Result<String, AuthError> {
        let token = strip_bearer(authorization);
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        // Reject algorithm substitution before touching the signature.
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "token header rejected");
            AuthError::InvalidToken
        })?;
        if header.alg != ALGORITHM {
            debug!(alg = ?header.alg, "token signed with unexpected algorithm");
            return Err(AuthError::InvalidToken);
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::InvalidToken
        })?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims.sub)
    }
}

/// Strip an optional `Bearer` scheme, case-insensitively, with any
/// surrounding whitespace.
fn strip_bearer(value: &str) -> &str {
    const SCHEME: &str = "bearer";

    let value = value.trim();
    match value.get(..SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SCHEME) => {
            let rest = &value[SCHEME.len()..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                value
            }
        }
        _ => value,
    }
}
