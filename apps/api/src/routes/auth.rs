//! Registration, login and token refresh.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shopdesk_core::validation::{validate_email, validate_name, validate_password};
use shopdesk_core::{NewUser, Role, User};

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::extract::{ApiForm, ApiJson, CurrentUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/register-admin", post(register_admin))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/users", post(register))
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// OAuth2 password-flow form. `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, ApiJson<PublicUser>), ApiError> {
    create_user(&state, body, Role::Normal).await
}

async fn register_admin(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, ApiJson<PublicUser>), ApiError> {
    create_user(&state, body, Role::Admin).await
}

async fn create_user(
    state: &AppState,
    body: RegisterRequest,
    role: Role,
) -> Result<(StatusCode, ApiJson<PublicUser>), ApiError> {
    validate_name(&body.name)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal)??;

    let user = state
        .db
        .users()
        .create(&NewUser {
            name: body.name.trim().to_string(),
            email: body.email.trim().to_string(),
            password_hash,
            role,
        })
        .await?;

    info!(user_id = user.id, ?role, "User registered");
    Ok((StatusCode::CREATED, ApiJson(user.into())))
}

async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<ApiJson<TokenResponse>, ApiError> {
    let rejected = || ApiError::bad_request("Incorrect email or password");

    let Some(user) = state.db.users().get_by_email(form.username.trim()).await? else {
        warn!("Login for unknown email");
        return Err(rejected());
    };

    let password = form.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(ApiError::internal)?;

    if !valid {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(rejected());
    }

    let token = state.jwt.issue_token(&user.email)?;
    info!(user_id = user.id, "User logged in");
    Ok(ApiJson(TokenResponse::bearer(token)))
}

async fn refresh_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiJson<TokenResponse>, ApiError> {
    let token = state.jwt.issue_token(&user.email)?;
    Ok(ApiJson(TokenResponse::bearer(token)))
}
