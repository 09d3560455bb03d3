//! Account registration, login, and the bearer-token extractor
//!
//! Every authenticated route takes an [`AuthUser`] argument; the
//! extractor verifies the `Authorization: Bearer` token statelessly
//! against the server signing secret and yields the caller's user id.

use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use waveroom_common::auth::{hash_password, issue_token, verify_password, verify_token};
use waveroom_common::db::User;

use crate::db::users;
use crate::{ApiError, ApiResult, AppState};

/// Verified caller identity, extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Expected bearer token".to_string()))?;

        let claims = verify_token(token, &state.signing_secret, Utc::now().timestamp())
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Session token plus the account it belongs to
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register
///
/// **Request:** `{"username", "email", "password", "display_name"}`
/// **Response:** `{"token", "user"}`
///
/// **Errors:**
/// - 400 Bad Request: empty username/password, or duplicate username/email
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }

    if users::username_exists(&state.db, username).await? {
        return Err(ApiError::BadRequest("Username already registered".to_string()));
    }
    if users::email_exists(&state.db, &payload.email).await? {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let user = User::new(
        username.to_string(),
        payload.email,
        payload.display_name,
    );
    let password_hash = hash_password(&payload.password);
    users::insert_user(&state.db, &user, &password_hash).await?;

    info!("Registered user {}", user.username);

    let token = issue_token(&user.id, &state.signing_secret, Utc::now().timestamp());
    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/login
///
/// **Errors:**
/// - 401 Unauthorized: unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, password_hash) = users::credentials_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &password_hash) {
        return Err(ApiError::Unauthorized("Invalid username or password".to_string()));
    }

    let token = issue_token(&user.id, &state.signing_secret, Utc::now().timestamp());
    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/auth/me
pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<User>> {
    let user = users::find_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;
    Ok(Json(user))
}

/// PUT /api/auth/me
///
/// Partial profile update; absent fields are left unchanged.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<User>> {
    let mut user = users::find_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if let Some(display_name) = payload.display_name {
        user.display_name = display_name;
    }
    if let Some(avatar) = payload.avatar {
        user.avatar = Some(avatar);
    }
    if let Some(bio) = payload.bio {
        user.bio = Some(bio);
    }
    if let Some(location) = payload.location {
        user.location = Some(location);
    }

    users::update_profile(&state.db, &user).await?;
    Ok(Json(user))
}
