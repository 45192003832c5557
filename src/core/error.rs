// Centralized error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::admin::ErrorResponse;

/// Conditions that stop the service from starting. Never recovered from.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("No port specified")]
    MissingPort,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid database: {0}")]
    InvalidDatabase(String),

    #[error("Failed to load users: {0}")]
    LoadUsers(String),
}

/// Errors raised by a backing store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Failed to (de)serialize allowed connections: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid row for user {id}: {reason}")]
    InvalidRow { id: String, reason: String },

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Too many login attempts")]
    RateLimited,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let status = match &self {
            LoginError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            LoginError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            LoginError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Failed to write to store: {0}")]
    StoreError(#[from] StoreError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AdminError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Conflict(_) => StatusCode::CONFLICT,
            AdminError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
