//! Handlers for the `/auth` resource (login, refresh, logout, me).

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use ccw_core::types::DbId;
use ccw_db::models::session::{CreateSession, SessionOrigin};
use ccw_db::models::user::{User, UserSummary};
use ccw_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client_ip::ClientIp;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// User info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Authenticate with username + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(|| {
            tracing::info!(target: "security", username = %input.username, "Login for unknown user");
            AppError::unauthorized("Invalid username or password")
        })?;

    if !user.is_active {
        return Err(AppError::forbidden("Account is deactivated"));
    }

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::forbidden(
                "Account is temporarily locked. Try again later.",
            ));
        }
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
        let (failures, locked_until) =
            UserRepo::record_failed_login(&state.pool, user.id, MAX_FAILED_ATTEMPTS, lock_until)
                .await?;
        tracing::warn!(target: "security", user_id = user.id, failures, "Failed login attempt");
        if failures >= MAX_FAILED_ATTEMPTS {
            tracing::warn!(
                target: "security",
                user_id = user.id,
                locked_until = ?locked_until,
                "Account locked after repeated failed logins"
            );
        }
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "User logged in");

    let origin = session_origin(&headers, client_ip);
    let (response, session) = build_auth_response(&state, &user, origin)?;
    SessionRepo::create(&state.pool, &session).await?;

    Ok(Json(response))
}

/// POST /api/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens. The old
/// refresh token is revoked in the same transaction, so it works only once.
pub async fn refresh(
    State(state): State<AppState>,
    client_ip: ClientIp,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_by_hash(&state.pool, &token_hash)
        .await?
        .filter(|session| session.is_redeemable(Utc::now()))
        .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

    if !user.is_active {
        return Err(AppError::forbidden("Account is deactivated"));
    }

    let origin = session_origin(&headers, client_ip);
    let (response, replacement) = build_auth_response(&state, &user, origin)?;

    SessionRepo::rotate(&state.pool, session.id, &replacement)
        .await?
        .ok_or_else(|| {
            tracing::warn!(target: "security", user_id = user.id, "Refresh token reused");
            AppError::unauthorized("Invalid or expired refresh token")
        })?;

    Ok(Json(response))
}

/// POST /api/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Json<UserSummary>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
    Ok(Json(UserSummary::from(&user)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn session_origin(headers: &HeaderMap, ip: ClientIp) -> SessionOrigin {
    SessionOrigin {
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        ip_address: ip.0.map(|ip| ip.to_string()),
    }
}

/// Sign tokens for `user` and describe the session row that backs them.
fn build_auth_response(
    state: &AppState,
    user: &User,
    origin: SessionOrigin,
) -> AppResult<(AuthResponse, CreateSession)> {
    let access_token =
        generate_access_token(user.id, &user.username, user.is_staff, &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at,
        origin,
    };

    let response = AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserInfo {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_staff: user.is_staff,
        },
    };

    Ok((response, session))
}
