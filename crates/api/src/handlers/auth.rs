//! Handlers for the `/auth` resource (signup, login, refresh, logout, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;
use venuebook_core::error::CoreError;
use venuebook_core::roles::Role;
use venuebook_db::models::session::{CreateSession, UserSession};
use venuebook_db::models::user::{CreateUser, User, UserResponse};
use venuebook_db::store::UQ_USERS_EMAIL;
use venuebook_db::Store;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by signup, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

const INVALID_CREDENTIALS: &str = "Invalid email, password or role";

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Register a student or faculty account and log it in. Returns 201.
pub async fn signup(
    State(state): State<AppState>,
    Json(mut input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input.email = normalize_email(&input.email);
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let name = input.name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("name is required".into()).into());
    }
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role: Role = input.role.parse()?;
    if !role.is_self_assignable() {
        return Err(CoreError::Validation(format!(
            "Role '{role}' cannot be chosen at signup. Must be one of: student, faculty"
        ))
        .into());
    }

    if state.store.find_user_by_email(&input.email).await?.is_some() {
        return Err(CoreError::DuplicateUser(input.email).into());
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create = CreateUser {
        name: name.to_string(),
        email: input.email.clone(),
        password_hash,
        role,
    };
    let user = match state.store.create_user(&create).await {
        Ok(user) => user,
        // Lost a race with a concurrent signup for the same email.
        Err(e) if e.is_unique_violation_of(UQ_USERS_EMAIL) => {
            return Err(CoreError::DuplicateUser(input.email).into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, role = %user.role, "User signed up");

    let response = create_auth_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password + role. Any mismatch is a 401 and
/// writes no session.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let unauthorized = || AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into()));

    let role: Role = input.role.parse().map_err(|_| unauthorized())?;
    let email = normalize_email(&input.email);

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .filter(|u| u.role == role)
        .ok_or_else(unauthorized)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(unauthorized());
    }

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = state
        .store
        .find_active_session(&token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // Token rotation: the presented token is single-use.
    claim_session(state.store.as_ref(), &session).await?;

    let user = state
        .store
        .find_user_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = state.store.revoke_all_sessions(auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
///
/// Return the authenticated user, for restoring a session on page load.
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state
        .store
        .find_user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Emails are compared case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Revoke `session` so its refresh token cannot be used again.
///
/// Only one caller wins the revoke. A concurrent refresh that read the same
/// session before it was revoked gets `Unauthorized` and mints nothing.
async fn claim_session(store: &dyn Store, session: &UserSession) -> AppResult<()> {
    if !store.revoke_session(session.id).await? {
        tracing::warn!(
            session_id = session.id,
            user_id = session.user_id,
            "Refresh token already used"
        );
        return Err(CoreError::Unauthorized("Invalid or expired refresh token".into()).into());
    }
    Ok(())
}

/// Generate access + refresh tokens, persist a session, and build the response.
async fn create_auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    state
        .store
        .create_session(&CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at,
        })
        .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserResponse::from(user),
    })
}
