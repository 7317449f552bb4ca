//! Bearer token middleware and the extractor handlers use to read its result.
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{auth::AuthError, error::AppError, AppState};

/// Id of the user a request was authenticated as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

/// Reject requests without a valid `Authorization: Bearer <token>` header.
///
/// On success the resolved [`AuthUser`] is stored in the request extensions.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let user_id = state.auth.authenticate(header)?;
    request.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Auth(AuthError::InvalidToken))
    }
}
