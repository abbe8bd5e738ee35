//! Request extractors.
//!
//! Use [`CurrentUser`] in handlers to require a bearer token:
//!
//! ```rust,ignore
//! async fn list_clients(
//!     CurrentUser(user): CurrentUser,
//!     State(state): State<AppState>,
//! ) -> Result<Json<ClientList>, ApiError> {
//!     // user is the resolved shopdesk_core::User
//! }
//! ```
//!
//! The `Api*` wrappers behave like their axum counterparts but reject with
//! [`ApiError`], so malformed input gets the same `{"detail": ...}` body as
//! every other failure.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::debug;

use shopdesk_core::User;

use crate::auth::{extract_bearer_token, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingCredentials)?;

        let email = state.jwt.resolve(token)?;

        let user = state
            .db
            .users()
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        debug!(user_id = user.id, "Authenticated request");
        Ok(CurrentUser(user))
    }
}

/// Fail with 403 unless `user` is an admin.
pub fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

// =============================================================================
// Rejection-mapped wrappers
// =============================================================================

/// JSON body extractor and response.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// URL-encoded form extractor.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

/// Path parameter extractor.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
