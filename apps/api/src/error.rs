//! HTTP error type.
//!
//! Every failure leaves a handler as an [`ApiError`] and is rendered as
//! `{"detail": "<message>"}` with the matching status code.
//!
//! ```text
//! ValidationError ─┐
//! CoreError ───────┤
//! DbError ─────────┼──► ApiError { status, message } ──► HTTP response
//! AuthError ───────┤
//! UploadError ─────┤
//! axum rejections ─┘
//! ```

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use shopdesk_core::{CoreError, ValidationError};
use shopdesk_db::DbError;

use crate::auth::AuthError;
use crate::images::UploadError;

/// Detail shown for every authentication failure.
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Not enough permission")
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Log the cause and hide it from the caller.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "Internal server error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let unauthorized = self.status == StatusCode::UNAUTHORIZED;
        let mut response = (
            self.status,
            Json(ErrorBody {
                detail: self.message,
            }),
        )
            .into_response();

        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) | CoreError::ClientNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            CoreError::InsufficientStock { .. } | CoreError::Validation(_) => {
                ApiError::bad_request(err.to_string())
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::Conflict(_)
            | DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. } => ApiError::bad_request(err.to_string()),
            DbError::Domain(core) => core.into(),
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ApiError::internal(err),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(_) | AuthError::Hashing(_) => ApiError::internal(err),
            _ => {
                warn!(reason = %err, "Rejected credentials");
                ApiError::unauthorized()
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        warn!(error = %err, "Image upload failed");
        ApiError::unprocessable(format!("Error on image upload: {err}"))
    }
}

// Extractor rejections are malformed requests: 422, as for any
// unparseable body.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::unprocessable(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_into_response_uses_detail_body() {
        let (status, body) = body_of(ApiError::bad_request("bad data")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"detail":"bad data"}"#);
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = ApiError::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let other = ApiError::forbidden().into_response();
        assert!(other.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_db_error_mapping() {
        let not_found: ApiError = DbError::not_found("Client", 3).into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "Client not found");

        let conflict: ApiError = DbError::conflict("CPF already exists").into();
        assert_eq!(conflict.status, StatusCode::BAD_REQUEST);
        assert_eq!(conflict.message, "CPF already exists");

        let internal: ApiError = DbError::QueryFailed("disk I/O".into()).into();
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.message.contains("disk"));
    }

    #[test]
    fn test_domain_error_mapping() {
        let missing: ApiError = DbError::Domain(CoreError::ProductNotFound(9)).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Item 9 not found");

        let stock: ApiError = CoreError::InsufficientStock {
            product: "Coffee".into(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(stock.status, StatusCode::BAD_REQUEST);
        assert_eq!(stock.message, "Not enough Coffee in stock");

        let invalid: ApiError = ValidationError::InvalidCpf.into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.message, "Invalid CPF");
    }

    #[test]
    fn test_auth_errors_collapse_to_one_message() {
        for err in [AuthError::MissingCredentials, AuthError::MissingSubject, AuthError::UnknownSubject] {
            let api: ApiError = err.into();
            assert_eq!(api.status, StatusCode::UNAUTHORIZED);
            assert_eq!(api.message, INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn test_upload_error_is_unprocessable() {
        let api: ApiError = UploadError::NotConfigured.into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.message.starts_with("Error on image upload: "));
    }
}
