//! Auth routes: registration, session login/logout, current user.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, UserPublic};
use crate::services::auth::{AuthService, RegistrationProfile};
use crate::state::AppState;

/// Request body for account registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Create a customer account and log it in.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns 400 for validation failures or a taken username.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserPublic>)> {
    let auth = AuthService::new(state.pool());

    let user = auth
        .register(
            &req.username,
            &req.email,
            &req.password,
            RegistrationProfile {
                first_name: &req.first_name,
                last_name: &req.last_name,
                phone_number: &req.phone_number,
                address: &req.address,
            },
        )
        .await?;

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    tracing::info!(user_id = %user.id, "account registered");

    Ok((StatusCode::CREATED, Json(UserPublic::from(&user))))
}

/// Log in with username and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for bad credentials.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserPublic>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&req.username, &req.password).await?;

    // Rotate the session ID on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(UserPublic::from(&user)))
}

/// Log out the current session.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Return the logged-in user's profile.
///
/// GET /api/auth/me
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserPublic>> {
    let users = UserRepository::new(state.pool());
    let user = users.public_by_id(current.id).await?;

    Ok(Json(user))
}
