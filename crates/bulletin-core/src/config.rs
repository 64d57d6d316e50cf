//! Configuration module for BulletinPro sync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation, defaults, and a builder
//! pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `remote.url`.
pub const ENV_REMOTE_URL: &str = "BULLETIN_REMOTE_URL";
/// Environment variable overriding `remote.api_key`.
pub const ENV_REMOTE_KEY: &str = "BULLETIN_REMOTE_KEY";
/// Environment variable overriding `storage.database_path`.
pub const ENV_DATABASE_PATH: &str = "BULLETIN_DATABASE_PATH";
/// Environment variable overriding `sync.interval_secs`.
pub const ENV_SYNC_INTERVAL: &str = "BULLETIN_SYNC_INTERVAL_SECS";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Hosted table service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the REST table API, e.g. `https://xyz.supabase.co/rest/v1`.
    pub url: String,
    /// Service key sent with every request. `None` until configured.
    pub api_key: Option<String>,
    /// Per-request timeout applied by the HTTP client.
    pub timeout_secs: u64,
}

/// Local store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
}

/// Background sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between the end of one sync pass and the start of the next.
    pub interval_secs: u64,
    /// Seconds `stop()` waits for the worker before giving up.
    pub stop_timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Loads `path` (or defaults) and applies environment overrides.
    pub fn load_with_env(path: &Path) -> Self {
        let mut config = Self::load_or_default(path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Applies overrides from a variable lookup (normally the process env).
    ///
    /// Unparseable numeric values are ignored so that a typo cannot zero the
    /// sync interval.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_REMOTE_URL) {
            self.remote.url = url;
        }
        if let Some(key) = lookup(ENV_REMOTE_KEY) {
            self.remote.api_key = Some(key);
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup(ENV_SYNC_INTERVAL).and_then(|v| v.trim().parse().ok()) {
            self.sync.interval_secs = secs;
        }
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/bulletinpro/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bulletinpro")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321/rest/v1".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        // ~/.local/share/BulletinPro/base.db on Linux, %APPDATA%\BulletinPro on Windows
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("BulletinPro");
        Self {
            database_path: data_dir.join("base.db"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            stop_timeout_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if !(self.remote.url.starts_with("http://") || self.remote.url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "remote.url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.remote.url),
            });
        }
        if self.remote.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if matches!(self.remote.api_key.as_deref(), Some(key) if key.trim().is_empty()) {
            errors.push(ValidationError {
                field: "remote.api_key".into(),
                message: "must not be blank when set".into(),
            });
        }

        // --- storage ---
        if self.storage.database_path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.database_path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- sync ---
        if self.sync.interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.stop_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "sync.stop_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use bulletin_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .remote_url("https://xyz.supabase.co/rest/v1")
///     .sync_interval_secs(300)
///     .database_path(PathBuf::from("/tmp/base.db"))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.url = url.into();
        self
    }

    pub fn remote_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.remote.api_key = Some(key.into());
        self
    }

    pub fn remote_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.timeout_secs = seconds;
        self
    }

    // --- storage ---

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.storage.database_path = path;
        self
    }

    // --- sync ---

    pub fn sync_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.interval_secs = seconds;
        self
    }

    pub fn sync_stop_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.sync.stop_timeout_secs = seconds;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
