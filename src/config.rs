use std::{env, net::SocketAddr, time::Duration};
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Sessions are valid for a fixed 30 days after login.
pub const SESSION_DURATION_DAYS: i64 = 30;

/// Where principals, roles and groups are persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL through a deadpool connection pool.
    Postgres { database_url: String },
    /// Process-local maps. Data is lost on restart.
    Memory,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The persistence backend.
    pub store: StoreBackend,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The HMAC key used to sign session tokens.
    pub secret: Zeroizing<Vec<u8>>,
    /// Upper bound on a single persistence round trip made while authenticating.
    pub store_timeout: Duration,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// `SECRET` is mandatory; every other variable has a default.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let secret = env::var("SECRET")
            .context("SECRET must be set (generate with: openssl rand -hex 32)")?;

        if secret.trim().is_empty() {
            anyhow::bail!("SECRET must not be empty");
        }

        let store = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .as_str()
        {
            "postgres" => StoreBackend::Postgres {
                database_url: env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set when STORE_BACKEND=postgres")?,
            },
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("Unknown STORE_BACKEND '{}' (expected postgres or memory)", other),
        };

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;

        let store_timeout_secs: u64 = env::var("STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("Invalid STORE_TIMEOUT_SECS")?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let secure_cookies = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string()) == "production";

        Ok(Self {
            store,
            bind_addr,
            secret: Zeroizing::new(secret.into_bytes()),
            store_timeout: Duration::from_secs(store_timeout_secs),
            cors_origins,
            secure_cookies,
        })
    }

    /// A configuration backed by the in-memory store, for local runs and tests.
    pub fn in_memory(secret: &[u8]) -> Self {
        Self {
            store: StoreBackend::Memory,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            secret: Zeroizing::new(secret.to_vec()),
            store_timeout: Duration::from_secs(5),
            cors_origins: vec!["http://localhost:3000".to_string()],
            secure_cookies: false,
        }
    }
}
