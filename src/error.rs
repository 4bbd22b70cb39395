use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::{mailer::MailError, store::StoreError};

/// Every failure an operation can surface to a caller.
///
/// Display strings are the stable, user-visible messages. Driver and
/// transport causes are kept for logging only.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("a user with that username already exists")]
    DuplicateUsername,
    #[error("a user with that email already exists")]
    DuplicateEmail,
    #[error("resource not found")]
    NotFound,
    #[error("resource was modified concurrently; reload and retry")]
    VersionConflict,
    #[error("resource already exists")]
    Conflict,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("failed to deliver notification")]
    Delivery(#[source] MailError),
    #[error("the server encountered a problem")]
    Persistence(#[source] StoreError),
    #[error("the server encountered a problem")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateUsername | Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::VersionConflict | Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound,
            StoreError::DuplicateUsername => Self::DuplicateUsername,
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::Conflict => Self::Conflict,
            StoreError::VersionConflict => Self::VersionConflict,
            other => Self::Persistence(other),
        }
    }
}

impl From<MailError> for AppError {
    fn from(e: MailError) -> Self {
        Self::Delivery(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Success envelope: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Persistence(cause) => error!(error = %cause, "persistence failure"),
            Self::Delivery(cause) => error!(error = %cause, "notification failure"),
            Self::Internal(cause) => error!(error = %cause, "internal failure"),
            other => warn!(%status, error = %other, "request rejected"),
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
