//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use hoopline_core::Pacing;
use hoopline_nba::ClientConfig;

/// Global configuration for hoopline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub pacing: PacingConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Seconds slept before every request
    pub request_delay_secs: u64,
    /// Seconds to wait after a failed request before retrying the same id
    pub failure_cooldown_secs: u64,
    /// Give up on an id after this many consecutive failures (unset = never)
    pub max_attempts: Option<u32>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        let pacing = Pacing::default();
        Self {
            request_delay_secs: pacing.request_delay.as_secs(),
            failure_cooldown_secs: pacing.failure_cooldown.as_secs(),
            max_attempts: pacing.max_attempts,
        }
    }
}

impl PacingConfig {
    pub fn to_pacing(self) -> Pacing {
        Pacing {
            request_delay: Duration::from_secs(self.request_delay_secs),
            failure_cooldown: Duration::from_secs(self.failure_cooldown_secs),
            max_attempts: self.max_attempts.filter(|n| *n > 0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub base_url: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url,
            timeout_secs: client.timeout.as_secs(),
            user_agent: client.user_agent,
        }
    }
}

impl HttpConfig {
    pub fn to_client_config(&self) -> ClientConfig {
        let mut base_url = self.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        ClientConfig {
            base_url,
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./hoopline.toml (current directory)
    /// 2. ~/.config/hoopline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("hoopline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "hoopline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.data_dir, PathBuf::from("./data"));
        assert_eq!(config.pacing.to_pacing(), Pacing::default());
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[output]
data_dir = "/tmp/nba"

[pacing]
request_delay_secs = 5
failure_cooldown_secs = 120
max_attempts = 10

[http]
base_url = "http://localhost:8080/stats"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.data_dir, PathBuf::from("/tmp/nba"));

        let pacing = config.pacing.to_pacing();
        assert_eq!(pacing.request_delay, Duration::from_secs(5));
        assert_eq!(pacing.failure_cooldown, Duration::from_secs(120));
        assert_eq!(pacing.max_attempts, Some(10));

        let client = config.http.to_client_config();
        assert_eq!(client.base_url, "http://localhost:8080/stats/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_max_attempts_means_unbounded() {
        let pacing = PacingConfig {
            max_attempts: Some(0),
            ..Default::default()
        };
        assert_eq!(pacing.to_pacing().max_attempts, None);
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hoopline.toml");
        std::fs::write(&path, "[pacing]\nrequest_delay_secs = 1\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.pacing.request_delay_secs, 1);
        assert_eq!(config.pacing.failure_cooldown_secs, 300);
    }

    #[test]
    fn from_file_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[pacing\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
