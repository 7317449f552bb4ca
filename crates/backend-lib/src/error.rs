// crates/backend-lib/src/error.rs

//! Central HTTP error type + Axum integration.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use passgate_common::{ErrorDetail, ErrorResponse};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid request body: {0}")]
    Json(#[from] JsonRejection),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(auth) => match auth {
                AuthError::InvalidCredentials | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                },
                AuthError::Conflict => StatusCode::CONFLICT,
                AuthError::InvalidInput(_) | AuthError::WeakPassword(_) => {
                    StatusCode::BAD_REQUEST
                },
                AuthError::MalformedHash
                | AuthError::Storage(_)
                | AuthError::Hashing(_)
                | AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Json(rejection) => rejection.status(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(auth) => match auth {
                AuthError::InvalidCredentials => "AUTH_001",
                AuthError::InvalidToken => "AUTH_002",
                AuthError::MalformedHash => "AUTH_003",
                AuthError::Conflict => "USER_001",
                AuthError::InvalidInput(_) => "VAL_001",
                AuthError::WeakPassword(_) => "VAL_002",
                AuthError::Storage(_) => "STORE_001",
                AuthError::Hashing(_) => "INT_002",
                AuthError::Signing(_) => "INT_003",
            },
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Auth(auth) => match auth {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::InvalidToken => "Authentication required".to_string(),
                AuthError::Conflict => "Email already registered".to_string(),
                // Validation messages carry no internal detail.
                AuthError::InvalidInput(msg) | AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::MalformedHash
                | AuthError::Storage(_)
                | AuthError::Hashing(_)
                | AuthError::Signing(_) => "An internal server error occurred".to_string(),
            },
            AppError::Json(_) => "Invalid request format".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            error!(code = error_code, error = %self, "request failed");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}
