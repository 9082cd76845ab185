//! Stateless session tokens.
//!
//! ## Token Format
//!
//! ```text
//! base64url(json(claims)) "." hex(HMAC-SHA256(secret, base64url(json(claims))))
//! ```
//!
//! Claims are `{"sub", "userId", "email", "role", "groups", "exp"}` where
//! `exp` is the expiry instant in fractional Unix seconds. There is no
//! header and no algorithm field; the format is fixed.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use super::encoding::to_compat_json;
use crate::config::AuthConfig;
use crate::models::{GroupMembership, Identity};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of every issued token.
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Separates the encoded claims from the signature
const SEGMENT_SEPARATOR: char = '.';

/// Padded on encode; decoding takes the payload with or without `=`.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token was rejected.
///
/// Callers that only need a yes/no answer use
/// [`TokenAuthority::identity_from`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed session token")]
    Malformed,

    #[error("Session token signature mismatch")]
    SignatureMismatch,

    #[error("Session token expired")]
    Expired,

    #[error("Session token is missing required claims")]
    IncompleteClaims,
}

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
    email: &'a str,
    role: &'a str,
    groups: &'a [GroupMembership],
    exp: f64,
}

#[derive(Deserialize)]
struct IdentityClaims {
    #[serde(rename = "userId")]
    user_id: String,
    email: String,
    role: String,
    groups: Vec<GroupMembership>,
}

/// Issues and verifies session tokens with a single secret.
///
/// Holds no mutable state; share it behind an `Arc` and call from any thread.
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    config: AuthConfig,
}

impl TokenAuthority {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue a token for `identity`, valid for 24 hours from now.
    pub fn issue(&self, identity: &Identity) -> String {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> String {
        let claims = Claims {
            sub: &identity.email,
            user_id: &identity.id,
            email: &identity.email,
            role: &identity.role,
            groups: &identity.groups,
            exp: unix_seconds(now + Duration::hours(TOKEN_LIFETIME_HOURS)),
        };

        let claims_json =
            to_compat_json(&claims).expect("session claims contain only strings and a float");
        let payload = PAYLOAD_ENGINE.encode(claims_json);
        let signature = hex::encode(self.sign(payload.as_bytes()));

        format!("{}{}{}", payload, SEGMENT_SEPARATOR, signature)
    }

    /// Verify a token and rebuild the identity it carries.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// Checks run in order: shape, signature, payload decoding, expiry,
    /// claim completeness. A token whose `exp` equals `now` is still valid.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let (payload, signature) = split_token(token)?;
        self.check_signature(payload, signature)?;

        let decoded = PAYLOAD_ENGINE
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Value = serde_json::from_slice(&decoded).map_err(|_| TokenError::Malformed)?;
        let Value::Object(ref fields) = claims else {
            return Err(TokenError::Malformed);
        };

        // A missing expiry counts as the epoch, i.e. long expired
        let expires_at = match fields.get("exp") {
            Some(exp) => exp.as_f64().ok_or(TokenError::Malformed)?,
            None => 0.0,
        };
        if expires_at < unix_seconds(now) {
            return Err(TokenError::Expired);
        }

        let claims: IdentityClaims =
            serde_json::from_value(claims).map_err(|_| TokenError::IncompleteClaims)?;

        Ok(Identity {
            id: claims.user_id,
            email: claims.email,
            role: claims.role,
            groups: claims.groups,
        })
    }

    /// Verify and collapse every failure into `None`.
    pub fn identity_from(&self, token: &str) -> Option<Identity> {
        self.verify(token).ok()
    }

    fn check_signature(&self, payload: &str, signature: &str) -> Result<(), TokenError> {
        let provided = hex::decode(signature).map_err(|_| TokenError::SignatureMismatch)?;

        // Only the lowercase rendering is accepted, so every character of
        // the signature segment is significant
        if hex::encode(&provided) != signature {
            return Err(TokenError::SignatureMismatch);
        }

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| TokenError::SignatureMismatch)
    }

    fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = self.mac();
        mac.update(data);
        mac.finalize().into_bytes().into()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.config.secret()).expect("HMAC can take key of any size")
    }
}

fn split_token(token: &str) -> Result<(&str, &str), TokenError> {
    let mut parts = token.split(SEGMENT_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(payload), Some(signature), None) => Ok((payload, signature)),
        _ => Err(TokenError::Malformed),
    }
}

/// Fractional Unix seconds at microsecond resolution
fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn authority(secret: &str) -> TokenAuthority {
        TokenAuthority::new(AuthConfig::new(secret))
    }

    fn admin() -> Identity {
        Identity {
            id: "user-1".to_string(),
            email: "admin@example.com".to_string(),
            role: "admin".to_string(),
            groups: vec![
                GroupMembership::new("team", "team-1", "Engineering"),
                GroupMembership::new("organization", "org-1", "Acme Corp"),
            ],
        }
    }

    /// Sign an arbitrary payload the way `issue_at` does
    fn sign_payload(authority: &TokenAuthority, claims_json: &str) -> String {
        let payload = PAYLOAD_ENGINE.encode(claims_json);
        let signature = hex::encode(authority.sign(payload.as_bytes()));
        format!("{}.{}", payload, signature)
    }

    #[test]
    fn test_issue_then_verify_returns_same_identity() {
        let authority = authority("test-secret");
        let token = authority.issue(&admin());

        let identity = authority.verify(&token).expect("fresh token should verify");
        assert_eq!(identity, admin());
        assert_eq!(identity.groups[0].name, "Engineering");
        assert_eq!(identity.groups[1].name, "Acme Corp");
        assert_eq!(authority.identity_from(&token), Some(admin()));
    }

    #[test]
    fn test_group_order_is_preserved() {
        let authority = authority("test-secret");
        let mut identity = admin();
        identity.groups.reverse();
        identity.groups.push(GroupMembership::new("team", "team-1", "Engineering"));

        let token = authority.issue(&identity);
        assert_eq!(authority.verify(&token).unwrap().groups, identity.groups);
    }

    #[test]
    fn test_token_layout() {
        let authority = authority("test-secret");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let token = authority.issue_at(&admin(), now);

        let (payload, signature) = token.split_once('.').unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

        let claims = String::from_utf8(PAYLOAD_ENGINE.decode(payload).unwrap()).unwrap();
        assert_eq!(
            claims,
            concat!(
                r#"{"sub": "admin@example.com", "userId": "user-1", "email": "admin@example.com", "#,
                r#""role": "admin", "groups": [{"type": "team", "id": "team-1", "name": "Engineering"}, "#,
                r#"{"type": "organization", "id": "org-1", "name": "Acme Corp"}], "exp": 1704153600.0}"#
            )
        );
    }

    #[test]
    fn test_any_single_character_flip_is_rejected() {
        let authority = authority("test-secret");
        let token = authority.issue(&admin());

        for (i, original) in token.char_indices() {
            if original == '.' {
                continue;
            }
            let replacement = if original == 'a' { 'b' } else { 'a' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert!(
                authority.verify(&tampered).is_err(),
                "flip at {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_uppercase_signature_is_rejected() {
        let authority = authority("test-secret");
        let token = authority.issue(&admin());
        let (payload, signature) = token.split_once('.').unwrap();
        let shouted = format!("{}.{}", payload, signature.to_uppercase());

        assert_eq!(authority.verify(&shouted), Err(TokenError::SignatureMismatch));
    }

    #[test]
    fn test_expired_after_24_hours() {
        let authority = authority("test-secret");
        let issued = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let token = authority.issue_at(&admin(), issued);

        assert!(authority.verify_at(&token, issued + Duration::hours(23)).is_ok());
        // Expiry instant itself is still accepted
        assert!(authority.verify_at(&token, issued + Duration::hours(24)).is_ok());
        assert_eq!(
            authority.verify_at(&token, issued + Duration::hours(24) + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_past_exp_claim_is_rejected() {
        let authority = authority("test-secret");
        let token = sign_payload(
            &authority,
            r#"{"sub": "a@b.c", "userId": "u", "email": "a@b.c", "role": "user", "groups": [], "exp": 1000.0}"#,
        );
        assert_eq!(authority.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_missing_exp_is_expired() {
        let authority = authority("test-secret");
        let token = sign_payload(
            &authority,
            r#"{"userId": "u", "email": "a@b.c", "role": "user", "groups": []}"#,
        );
        assert_eq!(authority.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_missing_claim_is_incomplete() {
        let authority = authority("test-secret");
        let token = sign_payload(
            &authority,
            r#"{"userId": "u", "email": "a@b.c", "groups": [], "exp": 99999999999.0}"#,
        );
        assert_eq!(authority.verify(&token), Err(TokenError::IncompleteClaims));

        let token = sign_payload(
            &authority,
            r#"{"userId": "u", "email": "a@b.c", "role": "r", "groups": [{"type": "team"}], "exp": 99999999999.0}"#,
        );
        assert_eq!(authority.verify(&token), Err(TokenError::IncompleteClaims));
    }

    #[test]
    fn test_unparseable_payload_is_malformed() {
        let authority = authority("test-secret");
        assert_eq!(
            authority.verify(&sign_payload(&authority, "not json")),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            authority.verify(&sign_payload(&authority, "[1, 2, 3]")),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            authority.verify(&sign_payload(&authority, r#"{"exp": "tomorrow"}"#)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_signed_but_undecodable_payload_is_malformed() {
        let authority = authority("test-secret");
        let payload = "!!not-base64!!";
        let token = format!("{}.{}", payload, hex::encode(authority.sign(payload.as_bytes())));
        assert_eq!(authority.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_unpadded_payload_is_accepted() {
        let authority = authority("test-secret");
        let claims = r#"{"userId": "u", "email": "a@b.c", "role": "user", "groups": [], "exp": 99999999999.0}"#;
        let payload = PAYLOAD_ENGINE.encode(claims);
        let unpadded = payload.trim_end_matches('=');
        assert_ne!(payload, unpadded);

        let token = format!("{}.{}", unpadded, hex::encode(authority.sign(unpadded.as_bytes())));
        assert_eq!(authority.verify(&token).unwrap().id, "u");
    }

    #[test]
    fn test_wrong_segment_count_is_malformed() {
        let authority = authority("test-secret");
        let token = authority.issue(&admin());

        for candidate in [
            String::new(),
            "no-separator".to_string(),
            token.replace('.', ""),
            format!("{}.extra", token),
            format!("..{}", token),
            ".".repeat(5),
        ] {
            assert_eq!(authority.verify(&candidate), Err(TokenError::Malformed));
        }
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = authority("secret-a").issue(&admin());
        assert_eq!(
            authority("secret-b").verify(&token),
            Err(TokenError::SignatureMismatch)
        );
        assert!(authority("secret-a").verify(&token).is_ok());
    }

    #[test]
    fn test_default_secret_token_interop() {
        // Same secret, independent instances
        let token = TokenAuthority::new(AuthConfig::default()).issue(&admin());
        let identity = TokenAuthority::new(AuthConfig::default()).verify(&token);
        assert_eq!(identity, Ok(admin()));
    }
}
