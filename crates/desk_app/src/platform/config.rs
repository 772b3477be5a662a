use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use desk_engine::{BackoffPolicy, EngineSettings, GatewaySettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::{LogDestination, LogLevel};

/// Resolution desk: review and post generated ticket solutions.
#[derive(Debug, Parser)]
#[command(name = "desk", version)]
pub struct Cli {
    /// RON configuration file; a missing file means defaults.
    #[arg(long, default_value = "desk.ron")]
    pub config: PathBuf,

    /// Base URL of the ticket API.
    #[arg(long, env = "DESK_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the persisted solution cache.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Keep the solution cache in memory only.
    #[arg(long)]
    pub ephemeral: bool,

    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub api_base_url: String,
    pub state_dir: PathBuf,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub stream_backoff_initial_ms: u64,
    pub stream_backoff_max_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: LogLevel,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            state_dir: PathBuf::from(".desk"),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            stream_backoff_initial_ms: 1_000,
            stream_backoff_max_ms: 30_000,
            log_destination: LogDestination::File,
            log_level: LogLevel::Info,
        }
    }
}

impl DeskConfig {
    /// Loads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Flags win over the file. `DESK_API_URL` reaches here through clap.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.api_url {
            self.api_base_url = url.clone();
        }
        if let Some(dir) = &cli.state_dir {
            self.state_dir = dir.clone();
        }
        if let Some(destination) = cli.log {
            self.log_destination = destination;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".to_string()));
        }
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        if self.stream_backoff_initial_ms == 0 {
            return Err(ConfigError::Invalid(
                "stream_backoff_initial_ms must be positive".to_string(),
            ));
        }
        if self.stream_backoff_max_ms < self.stream_backoff_initial_ms {
            return Err(ConfigError::Invalid(format!(
                "stream_backoff_max_ms ({}) is below stream_backoff_initial_ms ({})",
                self.stream_backoff_max_ms, self.stream_backoff_initial_ms
            )));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            gateway: GatewaySettings {
                base_url: self.api_base_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
            },
            backoff: BackoffPolicy {
                initial: Duration::from_millis(self.stream_backoff_initial_ms),
                max: Duration::from_millis(self.stream_backoff_max_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::{Cli, ConfigError, DeskConfig};
    use crate::platform::logging::{LogDestination, LogLevel};

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeskConfig::load(&dir.path().join("desk.ron")).unwrap();
        assert_eq!(config, DeskConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.ron");
        std::fs::write(
            &path,
            r#"(api_base_url: "http://desk.internal:9000", log_level: Debug, stream_backoff_max_ms: 5000)"#,
        )
        .unwrap();

        let config = DeskConfig::load(&path).unwrap();
        assert_eq!(config.api_base_url, "http://desk.internal:9000");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.stream_backoff_max_ms, 5_000);
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.log_destination, LogDestination::File);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.ron");
        std::fs::write(&path, "(api_base_url: ").unwrap();

        let err = DeskConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::parse_from([
            "desk",
            "--api-url",
            "http://flag:1",
            "--state-dir",
            "/tmp/desk-state",
            "--log",
            "both",
        ]);
        let config = DeskConfig {
            api_base_url: "http://file:1".to_string(),
            ..DeskConfig::default()
        }
        .with_overrides(&cli);

        assert_eq!(config.api_base_url, "http://flag:1");
        assert_eq!(config.state_dir, PathBuf::from("/tmp/desk-state"));
        assert_eq!(config.log_destination, LogDestination::Both);
        assert!(!cli.ephemeral);
    }

    #[test]
    fn backoff_cap_below_initial_is_rejected() {
        let config = DeskConfig {
            stream_backoff_initial_ms: 2_000,
            stream_backoff_max_ms: 1_000,
            ..DeskConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(DeskConfig::default().validate().is_ok());
    }

    #[test]
    fn engine_settings_carry_durations() {
        let settings = DeskConfig::default().engine_settings();
        assert_eq!(settings.gateway.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.backoff.max, Duration::from_secs(30));
    }
}
