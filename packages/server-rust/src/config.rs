//! Process configuration: command-line flags (with environment fallbacks)
//! and decoding of the integration configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::de::DeserializeOwned;

use crate::network::NetworkConfig;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Command-line interface of the `handoff` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "handoff", version, about = "Hot-reloading integration supervisor")]
pub struct Cli {
    /// Path of the JSON integration configuration file.
    #[arg(long, env = "HANDOFF_CONFIG")]
    pub config: PathBuf,

    /// Identifier of the supervised integration. Becomes a path segment, so
    /// only ASCII letters, digits, `_` and `-` are accepted.
    #[arg(
        long,
        env = "HANDOFF_INTEGRATION_ID",
        default_value = "heartbeat",
        value_parser = parse_integration_id
    )]
    pub integration_id: String,

    /// Bind address of the HTTP server.
    #[arg(long, env = "HANDOFF_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port of the HTTP server. 0 lets the OS choose.
    #[arg(long, env = "HANDOFF_PORT", default_value_t = 12345)]
    pub port: u16,

    /// Maximum time an HTTP request may take.
    #[arg(long, env = "HANDOFF_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "HANDOFF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

fn parse_integration_id(id: &str) -> Result<String, String> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(id.to_string())
    } else {
        Err(format!("{id:?} is not a valid integration id (expected [A-Za-z0-9_-]+)"))
    }
}

impl Cli {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }

    /// Base HTTP path of the supervised integration.
    #[must_use]
    pub fn integration_path(&self) -> String {
        format!("/integrations/{}", self.integration_id)
    }
}

/// Errors raised while loading the integration configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Decodes JSON bytes into a typed configuration. `path` is only used in errors.
///
/// # Errors
///
/// Returns `ConfigError::Decode` if the bytes are not valid for `T`.
pub fn decode<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ConfigError> {
    serde_json::from_slice(bytes).map_err(|source| ConfigError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and decodes the configuration file at `path`.
///
/// # Errors
///
/// Returns `ConfigError::Read` on I/O failure, `ConfigError::Decode` on bad content.
pub async fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode(path, &bytes)
}
