//! # Client Configuration
//!
//! Configuration for the catalog client: where the API lives, how
//! connectivity is probed, how replay behaves and where the offline store is
//! kept.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CATALOG_API_URL=https://catalog.example.com                        │
//! │     CATALOG_DB_PATH=/var/lib/catalog/catalog.db                        │
//! │     CATALOG_MAX_IN_FLIGHT=8                                            │
//! │     CATALOG_PROBE_INTERVAL_SECS=10                                     │
//! │     CATALOG_REQUEUE_FAILED=true                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/catalog-client/client.toml (Linux)                       │
//! │     ~/Library/Application Support/com.catalog.client/client.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [api]
//! base_url = "https://catalog.example.com"
//! request_timeout_secs = 30
//!
//! [connectivity]
//! probe_interval_secs = 5
//! probe_timeout_ms = 2000
//!
//! [replay]
//! max_in_flight = 4
//! requeue_failed_online = false
//!
//! [storage]
//! database_path = "/var/lib/catalog/catalog.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

/// Default API base URL (local development server).
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Config file name inside the platform config directory.
const CONFIG_FILE_NAME: &str = "client.toml";

/// Database file name inside the platform data directory.
const DATABASE_FILE_NAME: &str = "catalog.db";

// =============================================================================
// API Settings
// =============================================================================

/// Remote catalog API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoints are appended (`/api/public/get`, `/api/public/add`).
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Per-request timeout. Unset means the HTTP client's default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_api_url(),
            request_timeout_secs: None,
        }
    }
}

// =============================================================================
// Connectivity Settings
// =============================================================================

/// How the connectivity probe checks reachability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivitySettings {
    /// Seconds between probes.
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// TCP connect timeout for one probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

fn default_probe_interval() -> u64 {
    5
}
fn default_probe_timeout() -> u64 {
    2000
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        ConnectivitySettings {
            probe_interval_secs: default_probe_interval(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

// =============================================================================
// Replay Settings
// =============================================================================

/// Offline queue replay behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySettings {
    /// Maximum concurrent submissions during one replay.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Put a failed online submission into the offline queue instead of
    /// reporting it as failed.
    #[serde(default)]
    pub requeue_failed_online: bool,
}

fn default_max_in_flight() -> usize {
    4
}

impl Default for ReplaySettings {
    fn default() -> Self {
        ReplaySettings {
            max_in_flight: default_max_in_flight(),
            requeue_failed_online: false,
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the offline store lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Unset means `<platform data dir>/catalog.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub connectivity: ConnectivitySettings,

    #[serde(default)]
    pub replay: ReplaySettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl ClientConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let base = &self.api.base_url;
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(SyncError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                base
            )));
        }
        url::Url::parse(base)?;

        if self.replay.max_in_flight == 0 {
            return Err(SyncError::InvalidConfig(
                "max_in_flight must be greater than 0".into(),
            ));
        }

        if self.connectivity.probe_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "probe_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CATALOG_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(path) = std::env::var("CATALOG_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Ok(value) = std::env::var("CATALOG_MAX_IN_FLIGHT") {
            match value.parse::<usize>() {
                Ok(n) => self.replay.max_in_flight = n,
                Err(_) => warn!(value = %value, "Ignoring invalid CATALOG_MAX_IN_FLIGHT"),
            }
        }

        if let Ok(value) = std::env::var("CATALOG_PROBE_INTERVAL_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.connectivity.probe_interval_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring invalid CATALOG_PROBE_INTERVAL_SECS"),
            }
        }

        if let Ok(value) = std::env::var("CATALOG_REQUEUE_FAILED") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.replay.requeue_failed_online = true,
                "0" | "false" | "no" => self.replay.requeue_failed_online = false,
                _ => warn!(value = %value, "Unknown CATALOG_REQUEUE_FAILED value"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "catalog", "client")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the offline store path: the configured one, or the platform
    /// data directory, or the working directory as a last resort.
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.storage.database_path {
            return path.clone();
        }

        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    /// Returns the request timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.connectivity.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity.probe_timeout_ms)
    }
}
