//! User routes: register, login, refresh, logout, me.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use notekeep_core::{ErrorKind, User};
use notekeep_store::{IssuedSession, NewUser};
use serde::{Deserialize, Serialize};

use crate::auth::{self, AuthenticatedUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl SessionResponse {
    fn new(user: User, session: IssuedSession) -> Self {
        Self {
            user,
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            refresh_expires_at: session.refresh_expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

fn validate_register(request: &RegisterRequest) -> ApiResult<()> {
    if !request.email.contains('@') {
        return Err(ApiError::BadRequest("email is not valid".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /user/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    validate_register(&request)?;

    let new_user = NewUser {
        email: request.email.trim().to_lowercase(),
        name: request.name.trim().to_string(),
        password_hash: auth::hash_password_blocking(request.password).await?,
    };
    let (user, session) = state.sessions().register(&new_user).await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::new(user, session))))
}

/// POST /user/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let LoginRequest { email, password } = request;
    let email = email.trim().to_lowercase();
    let (user, session) = state
        .sessions()
        .login(&email, |hash| auth::verify_password_blocking(password, hash))
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::Unauthorized => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            _ => ApiError::Store(e),
        })?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(SessionResponse::new(user, session)))
}

/// POST /user/refresh - New access token for a live session.
async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = state.sessions().refresh(&request.refresh_token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

/// POST /user/logout - Revokes the session of the presented refresh token.
async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<StatusCode> {
    state.sessions().logout(&request.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /user/me
async fn me(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<Json<User>> {
    Ok(Json(state.sessions().current_user(user.user_id).await?))
}

/// Build user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/refresh", post(refresh))
        .route("/user/logout", post(logout))
        .route("/user/me", get(me))
}
