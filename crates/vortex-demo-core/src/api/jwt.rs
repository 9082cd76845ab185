//! Signing of Vortex widget JWTs.
//!
//! Vortex API keys look like `VRTX.<key id>.<secret>` where the key id is
//! a base64url-encoded 16-byte UUID. Widget JWTs are HS256 tokens whose
//! signing key is `HMAC-SHA256(secret, key id as UUID string)` and whose
//! header `kid` names the key id.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;

use super::ApiError;
use crate::models::Identity;

type HmacSha256 = Hmac<Sha256>;

const API_KEY_PREFIX: &str = "VRTX";

/// Lifetime of a widget JWT.
const WIDGET_JWT_LIFETIME_MINUTES: i64 = 60;

/// The user a widget JWT is issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtPayload {
    pub user_id: String,
    pub identifiers: BTreeMap<String, String>,
    #[serde(default)]
    pub groups: Option<Vec<Value>>,
    #[serde(default)]
    pub role: Option<String>,
}

impl JwtPayload {
    /// Build the payload for a logged-in demo user.
    /// Groups are flattened to `type:id` strings.
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            user_id: identity.id.clone(),
            identifiers: BTreeMap::from([("email".to_string(), identity.email.clone())]),
            groups: Some(
                identity
                    .groups
                    .iter()
                    .map(|group| Value::from(group.scoped_id()))
                    .collect(),
            ),
            role: Some(identity.role.clone()),
        }
    }
}

#[derive(Serialize)]
struct WidgetClaims<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    identifiers: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<&'a Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    iat: i64,
    expires: i64,
}

/// Parsed `VRTX.<key id>.<secret>` key
struct ApiKeyParts<'a> {
    key_id: String,
    secret: &'a str,
}

fn parse_api_key(api_key: &str) -> Result<ApiKeyParts<'_>, ApiError> {
    let mut parts = api_key.split('.');
    let (encoded_id, secret) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(API_KEY_PREFIX), Some(encoded_id), Some(secret), None) if !secret.is_empty() => {
            (encoded_id, secret)
        }
        _ => {
            return Err(ApiError::InvalidApiKey(format!(
                "expected {}.<key id>.<secret>",
                API_KEY_PREFIX
            )))
        }
    };

    let id_bytes = URL_SAFE_NO_PAD
        .decode(encoded_id.trim_end_matches('='))
        .map_err(|e| ApiError::InvalidApiKey(format!("key id is not base64url: {}", e)))?;
    let key_id = Uuid::from_slice(&id_bytes)
        .map_err(|e| ApiError::InvalidApiKey(format!("key id is not a UUID: {}", e)))?;

    Ok(ApiKeyParts {
        key_id: key_id.to_string(),
        secret,
    })
}

fn signing_key(parts: &ApiKeyParts<'_>) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(parts.secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(parts.key_id.as_bytes());
    mac.finalize().into_bytes().into()
}

/// Sign a widget JWT for `payload` as of `now`.
pub fn sign(api_key: &str, payload: &JwtPayload, now: DateTime<Utc>) -> Result<String, ApiError> {
    let parts = parse_api_key(api_key)?;
    let key = signing_key(&parts);

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(parts.key_id);

    let claims = WidgetClaims {
        user_id: &payload.user_id,
        identifiers: &payload.identifiers,
        groups: payload.groups.as_ref(),
        role: payload.role.as_deref(),
        iat: now.timestamp(),
        expires: (now + Duration::minutes(WIDGET_JWT_LIFETIME_MINUTES)).timestamp(),
    };

    Ok(jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(&key))?)
}
