//! Application-level configuration loading for the pool and hint caches.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::hints::DEFAULT_HINT_TTL;
use crate::state::pool::DEFAULT_VARIETY_REFRESH_THRESHOLD;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BACK_CONFIG_PATH";
/// Upper bound of questions fetched into one pool.
const DEFAULT_POOL_SIZE: usize = 60;
/// Maximum questions returned by a single draw.
const DEFAULT_DRAW_SIZE: usize = 10;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Upper bound of questions fetched into one pool.
    pub pool_size: usize,
    /// Maximum questions returned by a single draw.
    pub draw_size: usize,
    /// Unseen fraction required before the primary pool rotates out.
    pub variety_refresh_threshold: f64,
    /// Time-to-live of cached hint payloads.
    pub hint_ttl: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults per field.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        pool_size = config.pool_size,
                        draw_size = config.draw_size,
                        "loaded cache configuration"
                    );
                    config
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
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            draw_size: DEFAULT_DRAW_SIZE,
            variety_refresh_threshold: DEFAULT_VARIETY_REFRESH_THRESHOLD,
            hint_ttl: DEFAULT_HINT_TTL,
        }
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Deserialize)]
struct RawConfig {
    pool_size: Option<usize>,
    draw_size: Option<usize>,
    variety_refresh_threshold: Option<f64>,
    hint_ttl_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let threshold = value
            .variety_refresh_threshold
            .filter(|threshold| (0.0..=1.0).contains(threshold))
            .unwrap_or_else(|| {
                if value.variety_refresh_threshold.is_some() {
                    warn!("variety_refresh_threshold outside [0, 1]; using default");
                }
                defaults.variety_refresh_threshold
            });

        Self {
            pool_size: value.pool_size.unwrap_or(defaults.pool_size),
            draw_size: value.draw_size.unwrap_or(defaults.draw_size),
            variety_refresh_threshold: threshold,
            hint_ttl: value
                .hint_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.hint_ttl),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
