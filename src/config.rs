//! Configuration Module
//!
//! Loads proxy and worker settings from environment variables.

use std::env;
use std::path::PathBuf;

use url::Url;

use crate::error::Result;
use crate::manifest::AssetManifest;
use crate::registry::{CacheNaming, VersionTag, DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_VERSION};
use crate::worker::WorkerSettings;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port the caching proxy listens on
    pub server_port: u16,
    /// Public origin of the site; only requests to it are intercepted
    pub site_origin: Url,
    /// Server that actually hosts the site's files
    pub upstream_url: Url,
    /// Prefix shared by all of this site's cache generations
    pub cache_prefix: String,
    /// Version tag of the deployed worker, validated by `worker_settings`
    pub cache_version: String,
    /// Activate new versions as soon as they install
    pub auto_skip_waiting: bool,
    /// Optional JSON manifest replacing the built-in asset lists
    pub manifest_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Proxy port (default: 3000)
    /// - `SITE_ORIGIN` - Site origin (default: http://localhost:3000)
    /// - `UPSTREAM_URL` - Origin server (default: http://localhost:8080)
    /// - `CACHE_PREFIX` - Generation name prefix (default: tingyuun-cache-)
    /// - `CACHE_VERSION` - Version tag (default: v1.1.0)
    /// - `AUTO_SKIP_WAITING` - true/false (default: true)
    /// - `MANIFEST_PATH` - JSON manifest file (default: built-in lists)
    ///
    /// Unparseable values fall back to their defaults, except
    /// `CACHE_VERSION`: it names the cache generation, so a malformed tag
    /// is rejected by [`Config::worker_settings`] instead.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            site_origin: env::var("SITE_ORIGIN")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.site_origin),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.upstream_url),
            cache_prefix: env::var("CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_prefix),
            cache_version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_version),
            auto_skip_waiting: env::var("AUTO_SKIP_WAITING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.auto_skip_waiting),
            manifest_path: env::var("MANIFEST_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Builds and validates the settings for the configured worker version.
    pub fn worker_settings(&self) -> Result<WorkerSettings> {
        let version: VersionTag = self.cache_version.trim().parse()?;
        let manifest = match &self.manifest_path {
            Some(path) => AssetManifest::from_file(path)?,
            None => AssetManifest::default(),
        };
        let settings = WorkerSettings::new(
            self.site_origin.clone(),
            CacheNaming::new(self.cache_prefix.clone(), version),
            manifest,
        )
        .with_auto_skip_waiting(self.auto_skip_waiting);

        settings.validate()?;
        Ok(settings)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            site_origin: Url::parse("http://localhost:3000").expect("valid default origin"),
            upstream_url: Url::parse("http://localhost:8080").expect("valid default upstream"),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            auto_skip_waiting: true,
            manifest_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.site_origin.as_str(), "http://localhost:3000/");
        assert_eq!(config.cache_prefix, "tingyuun-cache-");
        assert_eq!(config.cache_version, "v1.1.0");
        assert!(config.auto_skip_waiting);
        assert!(config.manifest_path.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for var in [
            "SERVER_PORT",
            "SITE_ORIGIN",
            "UPSTREAM_URL",
            "CACHE_PREFIX",
            "CACHE_VERSION",
            "AUTO_SKIP_WAITING",
            "MANIFEST_PATH",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.upstream_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.cache_version, "v1.1.0");
        assert!(config.auto_skip_waiting);
    }

    #[test]
    fn test_worker_settings_from_default_config() {
        let settings = Config::default().worker_settings().unwrap();
        assert_eq!(settings.naming.generation_name(), "tingyuun-cache-v1.1.0");
        assert!(settings.auto_skip_waiting);
        assert_eq!(settings.manifest, AssetManifest::default());
    }

    #[test]
    fn test_worker_settings_missing_manifest_file() {
        let config = Config {
            manifest_path: Some(PathBuf::from("/nonexistent/assets.json")),
            ..Config::default()
        };
        assert!(matches!(
            config.worker_settings(),
            Err(WorkerError::Config(_))
        ));
    }

    #[test]
    fn test_worker_settings_rejects_malformed_version() {
        for tag in ["v1.2", "1.2.0", "v1.2.0-beta", "latest"] {
            let config = Config {
                cache_version: tag.to_string(),
                ..Config::default()
            };
            assert!(
                matches!(config.worker_settings(), Err(WorkerError::Config(_))),
                "{} was accepted",
                tag
            );
        }
    }

    #[test]
    fn test_worker_settings_uses_configured_version() {
        let config = Config {
            cache_version: "v1.2.0".to_string(),
            ..Config::default()
        };
        let settings = config.worker_settings().unwrap();
        assert_eq!(settings.naming.generation_name(), "tingyuun-cache-v1.2.0");
    }
}
