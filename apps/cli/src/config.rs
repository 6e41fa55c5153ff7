//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/vidfuse/config.toml`
//! - Windows: `%APPDATA%/vidfuse/config.toml`
//!
//! `VIDFUSE_BACKEND_URL` overrides the stored backend URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vidfuse_http::RetryPolicy;

/// Environment variable overriding [`Config::backend_url`].
pub const BACKEND_URL_ENV: &str = "VIDFUSE_BACKEND_URL";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the VidFuse backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Multipart chunk size in MiB.
    #[serde(default = "default_chunk_size_mib")]
    pub chunk_size_mib: u64,

    /// Attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Per-attempt deadline for control requests and chunk uploads, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:5000".into()
}

fn default_chunk_size_mib() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    vidfuse_http::DEFAULT_MAX_ATTEMPTS
}

fn default_initial_backoff_ms() -> u64 {
    vidfuse_http::DEFAULT_INITIAL_BACKOFF.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    vidfuse_protocol::constants::CONTROL_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            chunk_size_mib: default_chunk_size_mib(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found,
    /// then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&config_path()?)?;
        config.apply_env_override(std::env::var(BACKEND_URL_ENV).ok());
        Ok(config)
    }

    /// Loads from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    fn apply_env_override(&mut self, backend_url: Option<String>) {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(backend_url = %url, "backend URL overridden from environment");
            self.backend_url = url;
        }
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size_mib.saturating_mul(1024 * 1024)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: None,
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("vidfuse")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("vidfuse").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/vidfuse/config.toml"))
    }
}
