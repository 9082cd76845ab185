//! API client for communicating with the Vortex REST API.
//!
//! This module provides the `VortexClient` struct for invitation
//! management calls and widget JWT signing.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use reqwest::{header, Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::jwt::{self, JwtPayload};
use super::ApiError;
use crate::config::VortexConfig;
use crate::models::{Invitation, InvitationTarget, InvitationsResponse};

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the API key on every request
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for Vortex.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct VortexClient {
    client: Client,
    config: VortexConfig,
    initial_backoff_ms: u64,
}

impl VortexClient {
    /// Create a new API client
    pub fn new(config: VortexConfig) -> Result<Self> {
        // Fail at startup rather than on the first request
        Url::parse(&config.base_url)
            .with_context(|| format!("Invalid Vortex base URL: {}", config.base_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            config,
            initial_backoff_ms: INITIAL_BACKOFF_MS,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Sign a widget JWT for the given user. Runs locally, no request is made.
    pub fn generate_jwt(&self, payload: &JwtPayload) -> Result<String> {
        let token = jwt::sign(&self.config.api_key, payload, Utc::now())?;
        debug!(user_id = %payload.user_id, "Signed Vortex widget JWT");
        Ok(token)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .with_context(|| format!("Invalid Vortex base URL: {}", self.config.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Vortex base URL cannot carry a path: {}", self.config.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn api_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let mut value = header::HeaderValue::from_str(&self.config.api_key)
            .context("Vortex API key is not a valid header value")?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, backing off and retrying while the API answers 429.
    async fn send<T: DeserializeOwned>(&self, method: Method, url: Url, body: Option<&Value>) -> Result<T> {
        let headers = self.api_headers()?;
        let mut retries = 0;
        let mut backoff_ms = self.initial_backoff_ms;

        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(ApiError::NetworkError)
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response body from {}", url))?;
                    // DELETE and similar calls may answer with an empty body
                    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
                    return serde_json::from_str(text)
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    // ===== Invitation Methods =====

    /// Fetch invitations addressed to a target such as an email address
    pub async fn get_invitations_by_target(&self, target_type: &str, target_value: &str) -> Result<Vec<Invitation>> {
        let mut url = self.endpoint(&["invitations"])?;
        url.query_pairs_mut()
            .append_pair("targetType", target_type)
            .append_pair("targetValue", target_value);
        let response: InvitationsResponse = self.send(Method::GET, url, None).await?;
        Ok(response.invitations)
    }

    /// Fetch invitations scoped to a group
    pub async fn get_invitations_by_group(&self, group_type: &str, group_id: &str) -> Result<Vec<Invitation>> {
        let url = self.endpoint(&["invitations", "by-group", group_type, group_id])?;
        let response: InvitationsResponse = self.send(Method::GET, url, None).await?;
        Ok(response.invitations)
    }

    /// Fetch a single invitation
    pub async fn get_invitation(&self, invitation_id: &str) -> Result<Invitation> {
        let url = self.endpoint(&["invitations", invitation_id])?;
        self.send(Method::GET, url, None).await
    }

    /// Revoke an invitation. Returns the API's response verbatim.
    pub async fn revoke_invitation(&self, invitation_id: &str) -> Result<Value> {
        let url = self.endpoint(&["invitations", invitation_id])?;
        self.send(Method::DELETE, url, None).await
    }

    /// Accept invitations on behalf of a target
    pub async fn accept_invitations(&self, invitation_ids: &[String], target: &InvitationTarget) -> Result<Value> {
        let url = self.endpoint(&["invitations", "accept"])?;
        let body = json!({
            "invitationIds": invitation_ids,
            "target": target,
        });
        self.send(Method::POST, url, Some(&body)).await
    }

    /// Re-send an invitation
    pub async fn reinvite(&self, invitation_id: &str) -> Result<Invitation> {
        let url = self.endpoint(&["invitations", invitation_id, "reinvite"])?;
        self.send(Method::POST, url, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{self, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> VortexClient {
        VortexClient::new(VortexConfig::new("VRTX.key.secret").with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = test_client("https://api.example.com/api/v1");
        assert_eq!(
            client.endpoint(&["invitations", "by-group", "team", "team-1"]).unwrap().as_str(),
            "https://api.example.com/api/v1/invitations/by-group/team/team-1"
        );

        // Trailing slash on the base does not produce an empty segment
        let client = test_client("https://api.example.com/api/v1/");
        assert_eq!(
            client.endpoint(&["invitations"]).unwrap().as_str(),
            "https://api.example.com/api/v1/invitations"
        );
    }

    #[test]
    fn test_endpoint_escapes_path_segments() {
        let client = test_client("https://api.example.com/api/v1");
        assert_eq!(
            client.endpoint(&["invitations", "a b/c"]).unwrap().as_str(),
            "https://api.example.com/api/v1/invitations/a%20b%2Fc"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(VortexClient::new(VortexConfig::new("k").with_base_url("not a url")).is_err());
    }

    #[test]
    fn test_api_key_header_is_sensitive() {
        let headers = test_client("https://api.example.com").api_headers().unwrap();
        let value = headers.get(API_KEY_HEADER).unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "VRTX.key.secret");
    }

    #[tokio::test]
    async fn test_unreachable_api_reports_send_failure() {
        // Nothing listens on the discard port
        let client = test_client("http://127.0.0.1:9");
        let err = client.get_invitation("inv-1").await.unwrap_err();
        assert!(err.to_string().contains("Failed to send GET request"));
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NetworkError(_))
        ));
    }

    // ===== Against a mock Vortex API =====

    /// Client for a mock server, with backoff shortened to keep tests fast
    async fn mock_api() -> (MockServer, VortexClient) {
        let server = MockServer::start().await;
        let client = VortexClient {
            initial_backoff_ms: 1,
            ..test_client(&format!("{}/api/v1", server.uri()))
        };
        (server, client)
    }

    #[tokio::test]
    async fn test_list_by_target_sends_query_and_key() {
        let (server, client) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations"))
            .and(query_param("targetType", "email"))
            .and(query_param("targetValue", "sam@example.com"))
            .and(matchers::header(API_KEY_HEADER, "VRTX.key.secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invitations": [
                    {"id": "inv-1", "status": "delivered", "deliveryCount": null},
                    {"id": "inv-2", "target": []}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let invitations = client
            .get_invitations_by_target("email", "sam@example.com")
            .await
            .unwrap();
        assert_eq!(invitations.len(), 2);
        assert_eq!(invitations[0].status(), Some("delivered"));
        assert_eq!(
            serde_json::to_value(&invitations[1]).unwrap(),
            json!({"id": "inv-2", "target": []})
        );
    }

    #[tokio::test]
    async fn test_list_by_group_path() {
        let (server, client) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/by-group/team/team-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"invitations": []})))
            .expect(1)
            .mount(&server)
            .await;

        let invitations = client.get_invitations_by_group("team", "team-1").await.unwrap();
        assert!(invitations.is_empty());
    }

    #[tokio::test]
    async fn test_accept_posts_ids_and_target() {
        let (server, client) = mock_api().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/invitations/accept"))
            .and(body_json(json!({
                "invitationIds": ["inv-1", "inv-2"],
                "target": {"type": "email", "value": "sam@example.com"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": 2})))
            .expect(1)
            .mount(&server)
            .await;

        let target = InvitationTarget {
            target_type: "email".to_string(),
            value: "sam@example.com".to_string(),
        };
        let result = client
            .accept_invitations(&["inv-1".to_string(), "inv-2".to_string()], &target)
            .await
            .unwrap();
        assert_eq!(result, json!({"accepted": 2}));
    }

    #[tokio::test]
    async fn test_revoke_with_empty_body_is_null() {
        let (server, client) = mock_api().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/invitations/inv-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client.revoke_invitation("inv-1").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_reinvite_returns_invitation() {
        let (server, client) = mock_api().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/invitations/inv-1/reinvite"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "inv-1", "deliveryCount": 3})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let invitation = client.reinvite("inv-1").await.unwrap();
        assert_eq!(invitation.id, "inv-1");
        assert_eq!(invitation.fields.get("deliveryCount"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_error_statuses_map_to_api_errors() {
        let (server, client) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such invitation"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/forbidden"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/broken"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client.get_invitation("missing").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NotFound(body)) if body == "no such invitation"
        ));

        let err = client.get_invitation("forbidden").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)));

        let err = client.get_invitation("broken").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::ServerError(body)) if body == "maintenance"
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_retries() {
        let (server, client) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/inv-1"))
            .respond_with(ResponseTemplate::new(429))
            // First attempt plus every retry
            .expect(u64::from(MAX_RATE_LIMIT_RETRIES) + 1)
            .mount(&server)
            .await;

        let err = client.get_invitation("inv-1").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_rate_limit_recovers() {
        let (server, client) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/inv-1"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/inv-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "inv-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let invitation = client.get_invitation("inv-1").await.unwrap();
        assert_eq!(invitation.id, "inv-1");
    }

    #[tokio::test]
    async fn test_non_json_body_is_reported() {
        let (server, client) = mock_api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/invitations/inv-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client.get_invitation("inv-1").await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse JSON response"));
    }
}
