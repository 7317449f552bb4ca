// ============================
// backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{account, health};
use crate::middleware::require_bearer;
use crate::AppState;

/// Build the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/me", get(account::me))
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/api/register", post(account::register))
        .route("/api/login", post(account::login))
        .route("/health", get(health::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
