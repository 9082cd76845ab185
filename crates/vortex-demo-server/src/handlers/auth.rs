//! Login, logout and session lookup

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vortex_demo_core::Identity;

use crate::error::{AppError, AppResult};
use crate::session::{self, CurrentUser};
use crate::state::AppState;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response; `user` and `error` are always present, possibly null
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<Identity>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Identity,
}

/// Check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Response> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest("Email and password required".to_string()));
    }

    let Some(identity) = state.credentials.authenticate(&request.email, &request.password) else {
        warn!(email = %request.email, "Login failed");
        return Ok(Json(LoginResponse {
            success: false,
            user: None,
            error: Some("Invalid credentials".to_string()),
        })
        .into_response());
    };

    let token = state.authority.issue(&identity);
    let cookie = session::session_cookie(token, state.secure_cookies);
    info!(user_id = %identity.id, "User logged in");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: Some(identity),
            error: None,
        }),
    )
        .into_response())
}

/// End the session by clearing the cookie
pub async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, session::removal_cookie())],
        Json(LogoutResponse { success: true }),
    )
}

/// The logged-in user
pub async fn me(CurrentUser(user): CurrentUser) -> AppResult<Json<MeResponse>> {
    let user = user.ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
    Ok(Json(MeResponse { user }))
}
