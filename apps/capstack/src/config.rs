//! # Configuration
//!
//! Server settings come from CLI flags, each overridable by a `CAPSTACK_*`
//! environment variable. Scoring tables come from an optional JSON file.

use capstack_core::ScoringTables;
use std::path::{Path, PathBuf};

/// Minimum accepted length of the token secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Default token lifetime: seven days.
pub const DEFAULT_TOKEN_TTL_HOURS: u32 = 168;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no token secret configured (set --token-secret or CAPSTACK_TOKEN_SECRET)")]
    MissingSecret,

    #[error("token secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("cannot read scoring tables {path}: {source}")]
    TablesIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Tables(#[from] capstack_core::CoreError),

    #[error("invalid listen address {0}")]
    Address(String),
}

/// HTTP server settings.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    /// Host to bind to
    #[arg(short = 'H', long, env = "CAPSTACK_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CAPSTACK_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "CAPSTACK_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    /// Token lifetime in hours
    #[arg(long, env = "CAPSTACK_TOKEN_TTL_HOURS", default_value_t = DEFAULT_TOKEN_TTL_HOURS)]
    pub token_ttl_hours: u32,

    /// Allowed CORS origins, comma separated. Empty allows any origin.
    #[arg(long, env = "CAPSTACK_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Requests per second across all clients. 0 disables the limiter.
    #[arg(long, env = "CAPSTACK_RATE_LIMIT", default_value_t = 100)]
    pub rate_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            token_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            cors_origins: Vec::new(),
            rate_limit: 100,
        }
    }
}

impl ServerConfig {
    /// The configured secret, checked for presence and length.
    pub fn secret(&self) -> Result<&str, ConfigError> {
        let secret = self
            .token_secret
            .as_deref()
            .ok_or(ConfigError::MissingSecret)?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }
        Ok(secret)
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Address(raw))
    }
}

/// Load scoring tables from `path`, or the standard tables when `None`.
pub fn load_tables(path: Option<&Path>) -> Result<ScoringTables, ConfigError> {
    let Some(path) = path else {
        return Ok(ScoringTables::standard());
    };
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::TablesIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ScoringTables::from_json(&json)?)
}
