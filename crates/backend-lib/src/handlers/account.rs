// ============================
// crates/backend-lib/src/handlers/account.rs
// ============================
//! Register, login and current-user handlers.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use passgate_common::{Credentials, TokenResponse, UserProfile};
use tracing::{info, instrument};

use crate::{error::AppError, middleware::AuthUser, AppState};

/// `POST /api/register`: create an account and log it in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let Json(creds) = payload?;
    info!(email = %creds.email, "register");

    let user_id = state.auth.register(&creds.email, &creds.password).await?;
    let token = state.auth.issue_token(&user_id)?;

    Ok((StatusCode::CREATED, Json(token_response(&state, token))))
}

/// `POST /api/login`: exchange credentials for a bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(creds) = payload?;
    let token = state.auth.login(&creds.email, &creds.password).await?;
    Ok(Json(token_response(&state, token)))
}

/// `GET /api/me`: profile of the authenticated user.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let user = state.auth.current_user(&user_id).await?;
    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        created_at: user.created_at,
    }))
}

fn token_response(state: &AppState, token: String) -> TokenResponse {
    TokenResponse::bearer(token, state.auth.token_ttl().as_secs())
}
