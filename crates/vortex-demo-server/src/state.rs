use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use vortex_demo_core::api::VortexClient;
use vortex_demo_core::auth::{CredentialStore, TokenAuthority};

use crate::config::ServerConfig;

/// Shared state handed to every handler.
///
/// Everything here is read-only after startup, so cloning per request is
/// just a handful of reference-count bumps.
#[derive(Clone)]
pub struct AppState {
    pub authority: Arc<TokenAuthority>,
    pub credentials: Arc<CredentialStore>,
    /// `None` means demo mode
    pub vortex: Option<VortexClient>,
    pub secure_cookies: bool,
    pub public_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        authority: TokenAuthority,
        credentials: CredentialStore,
        vortex: Option<VortexClient>,
        secure_cookies: bool,
        public_dir: PathBuf,
    ) -> Self {
        Self {
            authority: Arc::new(authority),
            credentials: Arc::new(credentials),
            vortex,
            secure_cookies,
            public_dir,
            started_at: Utc::now(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let vortex = config
            .vortex
            .clone()
            .map(VortexClient::new)
            .transpose()
            .context("Failed to initialize Vortex client")?;

        Ok(Self::new(
            TokenAuthority::new(config.auth.clone()),
            CredentialStore::demo(),
            vortex,
            config.secure_cookies,
            config.public_dir.clone(),
        ))
    }

    pub fn demo_mode(&self) -> bool {
        self.vortex.is_none()
    }
}
