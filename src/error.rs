use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::auth::AuthError;

/// Every failure a handler can report. The message is what the client sees.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::UNPROCESSABLE_ENTITY,
            // Forbidden deliberately shares 401 with Unauthorized.
            AppError::Unauthorized(_) | AppError::Forbidden(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_inputs() -> Self {
        AppError::Validation("Invalid inputs passed,please check your data.".into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Missing | AuthError::Invalid => {
                AppError::Unauthorized("Authentication failed!".into())
            }
            AuthError::Forbidden(msg) => AppError::Forbidden(msg.into()),
        }
    }
}

/// `Json` whose rejection renders as a 422 `{message}` like every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        warn!(error = %e, "rejected json body");
        AppError::invalid_inputs()
    }
}

/// Parses a path id. Anything that is not a UUID cannot name a record.
pub fn parse_id(raw: &str, not_found: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(not_found.to_string()))
}

/// Collapse an internal failure into a client-safe `Internal` error, logging the cause.
pub trait ResultExt<T> {
    fn or_internal(self, message: &str) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_internal(self, message: &str) -> AppResult<T> {
        self.map_err(|e| {
            let e: anyhow::Error = e.into();
            error!(error = %format!("{e:#}"), "{message}");
            AppError::Internal(message.to_string())
        })
    }
}
