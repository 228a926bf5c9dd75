use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    config::IMGBB_API_KEY_ENV, dao::storage::StorageError, services::image_relay::RelayError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Write collides with an existing record.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The image host refused or failed the upload.
    #[error("image upload failed: {0}")]
    Upstream(String),
    /// The server lacks a setting it needs for this operation.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateSlug(slug) => {
                ServiceError::Conflict(format!("game slug `{slug}` already exists"))
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<RelayError> for ServiceError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::MissingApiKey => {
                ServiceError::Configuration(format!("{IMGBB_API_KEY_ENV} not set"))
            }
            RelayError::Rejected(message) => ServiceError::Upstream(message),
            RelayError::Internal(message) => ServiceError::Upstream(message),
        }
    }
}

/// Errors rendered as `{"message": ...}` HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// No signed-in user.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with stored data.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The image host failed us.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// No healthy storage backend.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Upstream(message) => AppError::BadGateway(message),
            ServiceError::Configuration(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody { message: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_slug_becomes_conflict() {
        let err: ServiceError = StorageError::DuplicateSlug("genshin".into()).into();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Conflict(ref m) if m.contains("genshin")));
        assert_eq!(app.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn relay_failures_map_to_gateway_and_internal() {
        let rejected: AppError = ServiceError::from(RelayError::Rejected("bad".into())).into();
        assert_eq!(rejected.into_response().status(), StatusCode::BAD_GATEWAY);

        let missing: AppError = ServiceError::from(RelayError::MissingApiKey).into();
        assert_eq!(
            missing.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn degraded_mode_is_service_unavailable() {
        let app: AppError = ServiceError::Degraded.into();
        assert_eq!(app.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
