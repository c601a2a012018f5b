//! Configuration for the lesson runner
//!
//! The courseware root, sandbox endpoint and default backend are explicit
//! values loaded from TOML and handed to the orchestrator at construction.
//! Nothing is read from the environment.

use crate::error::ConfigError;
use crate::language::Language;
use crate::types::Backend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Backend used when a caller does not pick one
    #[serde(default)]
    pub default_backend: Backend,

    #[serde(default)]
    pub lessons: LessonsConfig,

    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Where lessons live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonsConfig {
    pub root: PathBuf,
    /// Appended to lesson names given without an extension
    pub default_extension: String,
}

impl Default for LessonsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("courseware/lessons"),
            default_extension: "py".to_string(),
        }
    }
}

/// Local runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub working_dir: Option<PathBuf>,
    pub python: String,
    pub node: String,
    pub shell: String,
    /// How long to keep draining output pipes after a timed-out child is killed
    #[serde(with = "humantime_serde")]
    pub kill_grace: Duration,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            working_dir: None,
            python: "python3".to_string(),
            node: "node".to_string(),
            shell: "sh".to_string(),
            kill_grace: Duration::from_millis(200),
        }
    }
}

impl LocalConfig {
    /// Interpreter command for a script language, `None` to exec the file directly
    pub fn interpreter(&self, language: Option<Language>) -> Option<&str> {
        match language? {
            Language::Python => Some(&self.python),
            Language::Python2 => Some("python2"),
            Language::JavaScript => Some(&self.node),
            Language::Shell => Some(&self.shell),
        }
    }
}

/// Remote sandbox settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Limit for a single HTTP round trip
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Fixed limit for the liveness check
    #[serde(with = "humantime_serde")]
    pub health_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Total polling budget per submission
    #[serde(with = "humantime_serde")]
    pub max_wait: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:2358".to_string(),
            request_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(500),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl SandboxConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SandboxConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.remote.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.remote.base_url.clone(),
            source,
        })?;
        Ok(())
    }
}
