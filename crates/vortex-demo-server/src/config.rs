//! Command-line and environment configuration.
//!
//! Every flag can also be set through the environment variable named in
//! its `env` attribute; a `.env` file in the working directory is loaded
//! before parsing.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use vortex_demo_core::config::{DEFAULT_JWT_SECRET, DEFAULT_VORTEX_BASE_URL};
use vortex_demo_core::{AuthConfig, VortexConfig};

/// `NODE_ENV` value that turns on `Secure` cookies
const PRODUCTION_ENV: &str = "production";

#[derive(Parser, Debug)]
#[command(name = "vortex-demo")]
#[command(about = "Vortex demo server - demo login plus invitation management", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Interface to bind
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Secret for signing session tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEFAULT_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Vortex API key; without it the server runs in demo mode
    #[arg(long, env = "VORTEX_API_KEY", hide_env_values = true)]
    pub vortex_api_key: Option<String>,

    /// Base URL of the Vortex API
    #[arg(long, env = "VORTEX_API_BASE_URL", default_value = DEFAULT_VORTEX_BASE_URL)]
    pub vortex_base_url: String,

    /// Deployment environment; "production" marks cookies Secure
    #[arg(long, env = "NODE_ENV", default_value = "development")]
    pub node_env: String,

    /// Directory holding the demo frontend (index.html)
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub auth: AuthConfig,
    pub vortex: Option<VortexConfig>,
    pub secure_cookies: bool,
    pub public_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        let vortex = cli
            .vortex_api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| VortexConfig::new(key).with_base_url(cli.vortex_base_url));

        Self {
            listen_addr: SocketAddr::new(cli.host, cli.port),
            auth: AuthConfig::new(cli.jwt_secret),
            vortex,
            secure_cookies: cli.node_env.eq_ignore_ascii_case(PRODUCTION_ENV),
            public_dir: cli.public_dir,
            log_dir: cli.log_dir,
        }
    }
}
