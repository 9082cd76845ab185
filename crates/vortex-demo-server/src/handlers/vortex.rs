//! Vortex handlers
//!
//! Without a configured client every invitation route answers with a
//! canned demo payload. Client failures are reported in the body with a
//! 200 status so the demo frontend can show them inline.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use vortex_demo_core::api::JwtPayload;
use vortex_demo_core::models::InvitationTarget;

use crate::error::{AppError, AppResult};
use crate::session::CurrentUser;
use crate::state::AppState;

/// Explicit user for a widget JWT
#[derive(Debug, Default, Deserialize)]
pub struct JwtRequest {
    pub user_id: Option<String>,
    pub identifiers: Option<BTreeMap<String, String>>,
    pub groups: Option<Vec<Value>>,
    pub role: Option<String>,
}

impl JwtRequest {
    /// Usable only with a non-empty user id and at least one identifier
    fn into_payload(self) -> Option<JwtPayload> {
        let user_id = self.user_id.filter(|id| !id.is_empty())?;
        let identifiers = self.identifiers.filter(|ids| !ids.is_empty())?;
        Some(JwtPayload {
            user_id,
            identifiers,
            groups: self.groups,
            role: self.role,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    #[serde(rename = "targetType")]
    pub target_type: String,
    #[serde(rename = "targetValue")]
    pub target_value: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInvitationsRequest {
    #[serde(rename = "invitationIds")]
    pub invitation_ids: Vec<String>,
    pub target: InvitationTarget,
}

fn demo_error(context: &str, e: anyhow::Error) -> String {
    warn!(error = %format!("{:#}", e), "{} failed", context);
    format!("Demo mode: {:#}", e)
}

fn list_error(context: &str, e: anyhow::Error) -> Json<Value> {
    Json(json!({ "invitations": [], "error": demo_error(context, e) }))
}

fn single_error(context: &str, e: anyhow::Error) -> Json<Value> {
    Json(json!({ "error": demo_error(context, e) }))
}

/// Sign a widget JWT for the body's user or, failing that, the session user
pub async fn generate_jwt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    request: Option<Json<JwtRequest>>,
) -> AppResult<Json<Value>> {
    let Some(client) = &state.vortex else {
        return Err(AppError::ServiceUnavailable("Vortex SDK not available".to_string()));
    };

    let explicit = request.and_then(|Json(request)| request.into_payload());
    let payload = match (explicit, user) {
        (Some(payload), _) => payload,
        (None, Some(identity)) => JwtPayload::from_identity(&identity),
        (None, None) => {
            return Err(AppError::Unauthorized("Authentication required".to_string()));
        }
    };

    let jwt = client
        .generate_jwt(&payload)
        .map_err(|e| AppError::Internal(format!("Failed to generate JWT: {:#}", e)))?;
    Ok(Json(json!({ "jwt": jwt })))
}

pub async fn invitations_by_target(
    State(state): State<AppState>,
    Query(query): Query<TargetQuery>,
) -> Json<Value> {
    let Some(client) = &state.vortex else {
        info!("Demo mode: invitations by target");
        return Json(json!({
            "invitations": [{
                "id": "demo-1",
                "message": "Vortex SDK not available - this is a demo response",
            }]
        }));
    };

    match client
        .get_invitations_by_target(&query.target_type, &query.target_value)
        .await
    {
        Ok(invitations) => Json(json!({ "invitations": invitations })),
        Err(e) => list_error("Invitations by target", e),
    }
}

pub async fn invitations_by_group(
    State(state): State<AppState>,
    Path((group_type, group_id)): Path<(String, String)>,
) -> Json<Value> {
    let Some(client) = &state.vortex else {
        info!(%group_type, %group_id, "Demo mode: invitations by group");
        return Json(json!({
            "invitations": [{
                "id": format!("demo-group-{}-{}", group_type, group_id),
                "message": format!("Demo response for group {}/{}", group_type, group_id),
                "note": "Vortex SDK not fully available - this is a demo response",
            }]
        }));
    };

    match client.get_invitations_by_group(&group_type, &group_id).await {
        Ok(invitations) => Json(json!({ "invitations": invitations })),
        Err(e) => list_error("Invitations by group", e),
    }
}

/// Older query-string form used by the bundled frontend
pub async fn invitations_legacy(
    State(state): State<AppState>,
    Query(query): Query<TargetQuery>,
) -> Json<Value> {
    let Some(client) = &state.vortex else {
        info!("Demo mode: legacy invitations");
        return Json(json!({
            "invitations": [{
                "id": "demo-legacy",
                "message": format!("Demo response for {}={}", query.target_type, query.target_value),
            }]
        }));
    };

    match client
        .get_invitations_by_target(&query.target_type, &query.target_value)
        .await
    {
        Ok(invitations) => Json(json!({ "invitations": invitations })),
        Err(e) => list_error("Legacy invitations", e),
    }
}

pub async fn accept_invitations(
    State(state): State<AppState>,
    Json(request): Json<AcceptInvitationsRequest>,
) -> Json<Value> {
    let Some(client) = &state.vortex else {
        info!(count = request.invitation_ids.len(), "Demo mode: accept invitations");
        return Json(json!({
            "message": "Demo mode - invitations would be accepted",
            "invitationIds": request.invitation_ids,
        }));
    };

    match client
        .accept_invitations(&request.invitation_ids, &request.target)
        .await
    {
        Ok(result) => Json(result),
        Err(e) => single_error("Accept invitations", e),
    }
}

pub async fn get_invitation(
    State(state): State<AppState>,
    Path(invitation_id): Path<String>,
) -> Json<Value> {
    let Some(client) = &state.vortex else {
        return Json(json!({
            "id": invitation_id,
            "message": "Demo mode - invitation details",
        }));
    };

    let result = client
        .get_invitation(&invitation_id)
        .await
        .and_then(|invitation| Ok(serde_json::to_value(invitation)?));
    match result {
        Ok(invitation) => Json(invitation),
        Err(e) => single_error("Get invitation", e),
    }
}

pub async fn revoke_invitation(
    State(state): State<AppState>,
    Path(invitation_id): Path<String>,
) -> Json<Value> {
    let Some(client) = &state.vortex else {
        return Json(json!({
            "message": format!("Demo mode - invitation {} would be revoked", invitation_id),
        }));
    };

    match client.revoke_invitation(&invitation_id).await {
        Ok(result) => {
            info!(%invitation_id, "Invitation revoked");
            Json(result)
        }
        Err(e) => single_error("Revoke invitation", e),
    }
}

pub async fn reinvite(
    State(state): State<AppState>,
    Path(invitation_id): Path<String>,
) -> Json<Value> {
    let Some(client) = &state.vortex else {
        return Json(json!({
            "id": invitation_id,
            "message": "Demo mode - reinvite would be sent",
        }));
    };

    let result = client
        .reinvite(&invitation_id)
        .await
        .and_then(|invitation| Ok(serde_json::to_value(invitation)?));
    match result {
        Ok(invitation) => {
            info!(%invitation_id, "Invitation re-sent");
            Json(invitation)
        }
        Err(e) => single_error("Reinvite", e),
    }
}
