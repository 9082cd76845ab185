//! Health handler

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Invitation routes advertised by the health check
const VORTEX_ROUTES: [&str; 8] = [
    "POST /api/vortex/jwt",
    "GET /api/vortex/invitations/by-target",
    "GET /api/vortex/invitations/by-group/{type}/{id}",
    "GET /api/vortex/invitations",
    "POST /api/vortex/invitations/accept",
    "GET /api/vortex/invitations/{id}",
    "POST /api/vortex/invitations/{id}/reinvite",
    "DELETE /api/vortex/invitations/{id}",
];

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime_seconds: i64,
    pub vortex_sdk: &'static str,
    pub auth: &'static str,
    pub routes: Vec<&'static str>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let now = Utc::now();
    Json(HealthCheckResponse {
        status: "healthy",
        timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        uptime_seconds: (now - state.started_at).num_seconds(),
        vortex_sdk: if state.demo_mode() {
            "not available (demo mode)"
        } else {
            "available"
        },
        auth: "HMAC-SHA256 session cookie",
        routes: VORTEX_ROUTES.to_vec(),
    })
}
