//! Server setup and lifecycle management

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use vortex_demo_core::auth::DEMO_LOGINS;

use crate::config::ServerConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Vortex demo HTTP server
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    /// Run the server until Ctrl+C or SIGTERM
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr).await?;

        self.log_banner();

        let app = create_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Vortex demo server shut down");
        Ok(())
    }

    fn log_banner(&self) {
        let port = self.config.listen_addr.port();
        info!("Vortex demo listening on {}", self.config.listen_addr);
        info!("Visit http://localhost:{} to try the demo", port);
        info!("Health: http://localhost:{}/health", port);

        match &self.state.vortex {
            Some(client) => info!(base_url = %client.base_url(), "Vortex API client enabled"),
            None => warn!("VORTEX_API_KEY not set, invitation routes return demo responses"),
        }
        if self.config.auth.uses_default_secret() {
            warn!("JWT_SECRET not set, signing sessions with the built-in demo secret");
        }

        info!("Demo users:");
        for (email, password) in DEMO_LOGINS {
            info!("  - {} / {}", email, password);
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
