use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use roomboard_gateway::BroadcastScope;

/// 50 MB upload limit
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub broadcast_scope: BroadcastScope,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("ROOMBOARD_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("ROOMBOARD_PORT")
            .unwrap_or_else(|| "8001".into())
            .parse()
            .context("ROOMBOARD_PORT must be a port number")?;
        let db_path = lookup("ROOMBOARD_DB_PATH")
            .unwrap_or_else(|| "roomboard.db".into())
            .into();
        let upload_dir = lookup("ROOMBOARD_UPLOAD_DIR")
            .unwrap_or_else(|| "uploads".into())
            .into();
        let max_upload_bytes = match lookup("ROOMBOARD_MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse()
                .context("ROOMBOARD_MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let broadcast_scope = match lookup("ROOMBOARD_BROADCAST_SCOPE") {
            Some(v) => v.parse().context("ROOMBOARD_BROADCAST_SCOPE")?,
            None => BroadcastScope::default(),
        };

        Ok(Self {
            host,
            port,
            db_path,
            upload_dir,
            max_upload_bytes,
            broadcast_scope,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
