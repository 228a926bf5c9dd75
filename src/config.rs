//! Application-level configuration loading: optional JSON knobs plus the
//! environment-held image host credential.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::DEFAULT_POPULARITY;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_CHAPTERS_BACK_CONFIG_PATH";
/// Environment variable holding the image host API key.
pub const IMGBB_API_KEY_ENV: &str = "IMGBB_API_KEY";
/// Upload endpoint of the image host.
pub const DEFAULT_IMAGE_HOST_ENDPOINT: &str = "https://api.imgbb.com/1/upload";
/// Largest thumbnail accepted by the admin API (32 MiB).
pub const DEFAULT_THUMBNAIL_MAX_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Credential forwarded to the image host; never sent to clients.
    pub imgbb_api_key: Option<String>,
    /// Upload URL of the image host.
    pub image_host_endpoint: String,
    /// Largest decoded thumbnail accepted by the admin API.
    pub thumbnail_max_bytes: usize,
    /// Popularity given to new games.
    pub default_popularity: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("imgbb_api_key", &self.imgbb_api_key.as_ref().map(|_| "<redacted>"))
            .field("image_host_endpoint", &self.image_host_endpoint)
            .field("thumbnail_max_bytes", &self.thumbnail_max_bytes)
            .field("default_popularity", &self.default_popularity)
            .finish()
    }
}

impl AppConfig {
    /// Load the JSON knobs from disk (falling back to defaults) and read the
    /// API key from the environment.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    RawConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                RawConfig::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                RawConfig::default()
            }
        };

        let imgbb_api_key = env::var(IMGBB_API_KEY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        if imgbb_api_key.is_none() {
            warn!("{IMGBB_API_KEY_ENV} is not set; image uploads will fail");
        }

        Self::from_raw(raw, imgbb_api_key)
    }

    fn from_raw(raw: RawConfig, imgbb_api_key: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            imgbb_api_key,
            image_host_endpoint: raw
                .image_host_endpoint
                .unwrap_or(defaults.image_host_endpoint),
            thumbnail_max_bytes: raw
                .thumbnail_max_bytes
                .unwrap_or(defaults.thumbnail_max_bytes),
            default_popularity: raw
                .default_popularity
                .unwrap_or(defaults.default_popularity),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            imgbb_api_key: None,
            image_host_endpoint: DEFAULT_IMAGE_HOST_ENDPOINT.to_owned(),
            thumbnail_max_bytes: DEFAULT_THUMBNAIL_MAX_BYTES,
            default_popularity: DEFAULT_POPULARITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    image_host_endpoint: Option<String>,
    thumbnail_max_bytes: Option<usize>,
    default_popularity: Option<i64>,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"thumbnail_max_bytes": 1024}"#).unwrap();
        let config = AppConfig::from_raw(raw, Some("key".into()));

        assert_eq!(config.thumbnail_max_bytes, 1024);
        assert_eq!(config.image_host_endpoint, DEFAULT_IMAGE_HOST_ENDPOINT);
        assert_eq!(config.default_popularity, 100);
        assert_eq!(config.imgbb_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let config = AppConfig {
            imgbb_api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
