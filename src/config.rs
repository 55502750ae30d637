// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Process configuration, read once at startup from environment
//! variables (after an optional .env file has been loaded).

use anyhow::{Context, Result};
use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

/// Default request batch cap; requests with more texts get a 400.
pub const DEFAULT_MAX_BATCH: usize = 256;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (EMBED_SERVER_HOST, default 127.0.0.1).
    pub host: String,

    /// Bind port (EMBED_SERVER_PORT, default 5005).
    pub port: u16,

    /// Optional local directory holding model.onnx and tokenizer.json
    /// (EMBED_MODEL_DIR). Unset means hub resolution.
    pub model_dir: Option<PathBuf>,

    /// Maximum texts per request (EMBED_MAX_BATCH).
    pub max_batch: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5005,
            model_dir: None,
            max_batch: DEFAULT_MAX_BATCH,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the environment.
    ///
    /// Unset variables fall back to defaults; set-but-invalid numeric
    /// values are a startup error rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        let host = env::var("EMBED_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = match env::var("EMBED_SERVER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .context("EMBED_SERVER_PORT must be a valid port number")?,
            Err(_) => 5005,
        };

        let model_dir = env::var("EMBED_MODEL_DIR").ok().map(PathBuf::from);

        let max_batch = match env::var("EMBED_MAX_BATCH") {
            Ok(value) => {
                let parsed = value
                    .parse::<usize>()
                    .context("EMBED_MAX_BATCH must be a positive integer")?;
                if parsed == 0 {
                    anyhow::bail!("EMBED_MAX_BATCH must be greater than 0");
                }
                parsed
            }
            Err(_) => DEFAULT_MAX_BATCH,
        };

        Ok(Self {
            host,
            port,
            model_dir,
            max_batch,
        })
    }

    /// Socket address to bind the listener to.
    ///
    /// The host may be a literal IP or a hostname such as `localhost`;
    /// hostnames are resolved and the first address wins.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .context(format!(
                "Invalid bind address {}:{}",
                self.host, self.port
            ))?
            .next()
            .context(format!(
                "Bind address {}:{} resolved to nothing",
                self.host, self.port
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-var mutation is process-wide; serialize these tests.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "EMBED_SERVER_HOST",
            "EMBED_SERVER_PORT",
            "EMBED_MODEL_DIR",
            "EMBED_MAX_BATCH",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5005);
        assert_eq!(config.model_dir, None);
        assert_eq!(config.max_batch, DEFAULT_MAX_BATCH);
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("EMBED_SERVER_HOST", "0.0.0.0");
        env::set_var("EMBED_SERVER_PORT", "8080");
        env::set_var("EMBED_MODEL_DIR", "/opt/models/minilm");
        env::set_var("EMBED_MAX_BATCH", "64");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.model_dir, Some(PathBuf::from("/opt/models/minilm")));
        assert_eq!(config.max_batch, 64);

        clear_env();
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("EMBED_SERVER_PORT", "not-a-port");

        assert!(ServerConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_zero_max_batch_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("EMBED_MAX_BATCH", "0");

        assert!(ServerConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:5005");
    }

    #[test]
    fn test_socket_addr_accepts_hostname() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            ..ServerConfig::default()
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 5005);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_socket_addr_rejects_garbage_host() {
        let config = ServerConfig {
            host: "not a host name".to_string(),
            ..ServerConfig::default()
        };

        assert!(config.socket_addr().is_err());
    }
}
