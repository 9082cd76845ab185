//! Demo data handlers

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use vortex_demo_core::Identity;

use crate::error::{AppError, AppResult};
use crate::session::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DemoUsersResponse {
    pub users: Vec<Identity>,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: Identity,
    pub timestamp: String,
}

/// List the demo accounts (without password digests)
pub async fn list_demo_users(State(state): State<AppState>) -> Json<DemoUsersResponse> {
    Json(DemoUsersResponse {
        users: state.credentials.identities(),
    })
}

pub async fn protected(CurrentUser(user): CurrentUser) -> AppResult<Json<ProtectedResponse>> {
    let user = user.ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
    Ok(Json(ProtectedResponse {
        message: "This is a protected route!".to_string(),
        user,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    }))
}
