use std::time::Duration;

use backend_lib::auth::{AuthError, Claims, TokenIssuer, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

const SECRET: &str = "token-test-secret";

fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL).unwrap()
}

fn forge(claims: &Claims) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn claims_for(sub: &str, exp_offset: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        sub: sub.to_string(),
        iat: now,
        exp: now + exp_offset,
    }
}

#[test]
fn test_verify_accepts_prefixed_and_bare_tokens() {
    let issuer = issuer();
    let token = issuer.issue("user-1").unwrap();

    assert_eq!(issuer.verify(&token).unwrap(), "user-1");
    assert_eq!(issuer.verify(&format!("Bearer {token}")).unwrap(), "user-1");
    assert_eq!(issuer.verify(&format!("bearer {token}")).unwrap(), "user-1");
    assert_eq!(issuer.verify(&format!("  Bearer   {token}  ")).unwrap(), "user-1");
}

#[test]
fn test_empty_values_rejected() {
    let issuer = issuer();
    for value in ["", "   ", "Bearer", "Bearer ", "not.a.token", "garbage"] {
        assert_eq!(issuer.verify(value), Err(AuthError::InvalidToken), "value {value:?}");
    }
}

#[test]
fn test_wrong_secret_rejected() {
    let token = TokenIssuer::new("some-other-secret", DEFAULT_TOKEN_TTL)
        .unwrap()
        .issue("user-1")
        .unwrap();
    assert_eq!(issuer().verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn test_tampered_payload_rejected() {
    let issuer = issuer();
    let token = issuer.issue("user-1").unwrap();
    let parts: Vec<&str> = token.split('.').collect();

    let forged_payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&claims_for("admin", 3600)).unwrap(),
    );
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    assert_eq!(issuer.verify(&forged), Err(AuthError::InvalidToken));
}

#[test]
fn test_expired_token_rejected() {
    let token = forge(&claims_for("user-1", -1));
    assert_eq!(issuer().verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn test_unexpected_algorithm_rejected() {
    let token = encode(
        &Header::new(Algorithm::HS384),
        &claims_for("user-1", 3600),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(issuer().verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn test_unsigned_token_rejected() {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims_for("user-1", 3600)).unwrap());

    let issuer = issuer();
    assert_eq!(
        issuer.verify(&format!("{header}.{payload}.")),
        Err(AuthError::InvalidToken)
    );
    assert_eq!(
        issuer.verify(&format!("Bearer {header}.{payload}.")),
        Err(AuthError::InvalidToken)
    );
}

#[test]
fn test_missing_subject_rejected() {
    #[derive(Serialize)]
    struct NoSubject {
        iat: i64,
        exp: i64,
    }

    let now = Utc::now().timestamp();
    let token = encode(
        &Header::new(Algorithm::HS256),
        &NoSubject { iat: now, exp: now + 3600 },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(issuer().verify(&token), Err(AuthError::InvalidToken));

    let empty = forge(&claims_for("", 3600));
    assert_eq!(issuer().verify(&empty), Err(AuthError::InvalidToken));
}

#[test]
fn test_configured_ttl_sets_expiry() {
    let issuer = TokenIssuer::new(SECRET, Duration::from_secs(90)).unwrap();
    assert_eq!(issuer.ttl(), Duration::from_secs(90));

    let token = issuer.issue("user-1").unwrap();
    let payload = token.split('.').nth(1).unwrap();
    let claims: Claims = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.exp - claims.iat, 90);
}

#[test]
fn test_ttl_bounds() {
    assert!(TokenIssuer::new(SECRET, MAX_TOKEN_TTL).is_ok());
    assert!(TokenIssuer::new(SECRET, Duration::from_secs(u64::MAX)).is_err());
    assert!(TokenIssuer::new(SECRET, Duration::from_secs(i64::MAX as u64)).is_err());
}
