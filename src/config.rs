//! Application-level configuration loading for the catalog server and the games client.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAMER_SHOP_CONFIG_PATH";
/// Environment variable holding the base URL of the games API for clients.
const API_URL_ENV: &str = "GAMER_SHOP_API_URL";
/// Base URL used by clients when [`API_URL_ENV`] is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
/// Port the server binds when neither `PORT` nor `SERVER_PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Immutable runtime configuration of the catalog server.
pub struct AppConfig {
    /// Catalog file to serve; the embedded catalog is used when absent.
    pub catalog_path: Option<PathBuf>,
    /// Artificial delay added to every games response, for exercising loading states.
    pub simulated_latency: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        catalog = ?app_config.catalog_path,
                        latency_ms = app_config.simulated_latency.as_millis() as u64,
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON configuration format.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    catalog_path: Option<PathBuf>,
    simulated_latency_ms: u64,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            catalog_path: value
                .catalog_path
                .filter(|path| !path.as_os_str().is_empty()),
            simulated_latency: Duration::from_millis(value.simulated_latency_ms),
        }
    }
}

/// Connection settings for the games client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the games API, without trailing slash.
    pub base_url: String,
    /// Optional per-request timeout. Unset means requests may wait indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Attach a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a configuration from `GAMER_SHOP_API_URL`, defaulting to [`DEFAULT_API_URL`].
    pub fn from_env() -> Self {
        env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }
}

/// Port to bind, read from `PORT` or `SERVER_PORT`.
pub fn server_port() -> u16 {
    env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
