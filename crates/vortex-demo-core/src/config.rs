//! Configuration values injected into the token authority and the Vortex client.
//!
//! Nothing in this crate reads the environment directly; the server binary
//! resolves env vars and CLI flags and hands the results over through
//! these types.

use std::fmt;

/// Secret used when `JWT_SECRET` is not set.
pub const DEFAULT_JWT_SECRET: &str = "demo-secret-key";

/// Production endpoint of the Vortex API
pub const DEFAULT_VORTEX_BASE_URL: &str = "https://api.vortexsoftware.com/api/v1";

/// Signing configuration for session tokens.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Raw key bytes for the HMAC
    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_JWT_SECRET)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Connection settings for the Vortex API.
#[derive(Clone)]
pub struct VortexConfig {
    pub api_key: String,
    pub base_url: String,
}

impl VortexConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_VORTEX_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for VortexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VortexConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
