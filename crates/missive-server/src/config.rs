use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub message_rate_limit: u32,
    pub message_rate_window: Duration,
}

impl Config {
    /// Read from the environment. `.env` should already be loaded.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("MISSIVE_JWT_SECRET").unwrap_or_else(|| {
            warn!("MISSIVE_JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.into()
        });

        let host = var("MISSIVE_HOST", "0.0.0.0");
        let port: u16 = var("MISSIVE_PORT", "3000")
            .parse()
            .context("MISSIVE_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let message_rate_limit: u32 = var("MISSIVE_MESSAGE_RATE_LIMIT", "5")
            .parse()
            .context("MISSIVE_MESSAGE_RATE_LIMIT must be a positive integer")?;
        let window_secs: u64 = var("MISSIVE_MESSAGE_RATE_WINDOW_SECS", "60")
            .parse()
            .context("MISSIVE_MESSAGE_RATE_WINDOW_SECS must be a number of seconds")?;

        Ok(Self {
            jwt_secret,
            db_path: PathBuf::from(var("MISSIVE_DB_PATH", "missive.db")),
            addr,
            message_rate_limit,
            message_rate_window: Duration::from_secs(window_secs),
        })
    }
}
