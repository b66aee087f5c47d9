//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// The site shell: everything needed to render the site with no network.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    "/index.html",
    "/404.html",
    "/about/",
    "/about/index.html",
    "/gallery/",
    "/gallery/index.html",
    "/rooms/",
    "/rooms/index.html",
    "/booking/",
    "/booking/index.html",
    "/privacy-policy.html",
    "/terms.html",
    "/robots.txt",
    "/sitemap.xml",
    "/assets/css/style.css",
    "/assets/js/main.js",
    "/assets/partials/header.html",
    "/assets/partials/footer.html",
    "/favicon.ico",
    "/assets/images/favicon/apple-touch-icon.png",
    "/assets/images/favicon/favicon-32x32.png",
    "/assets/images/favicon/favicon-16x16.png",
    "/assets/images/favicon/favicon.ico",
    "/assets/images/favicon/android-chrome-192x192.png",
    "/assets/images/favicon/android-chrome-512x512.png",
    "/assets/images/favicon/site.webmanifest",
];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the worker is registered for (scheme, host, port).
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Cache version identifier. Bump it whenever the manifest or the
    /// serving strategy changes.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Absolute paths fetched and stored at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served when nothing better is available offline.
    ///
    /// Set via SWCACHE_FALLBACK_PATH environment variable.
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many manifest URLs are fetched at once during install.
    #[serde(default = "default_precache_concurrency")]
    pub precache_concurrency: usize,

    /// Activate a freshly installed worker without waiting for clients of
    /// the previous version to go away.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Take control of already-connected clients on activation.
    #[serde(default = "default_true")]
    pub claim_clients: bool,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_version() -> String {
    "svityazhome-v12".into()
}

fn default_precache() -> Vec<String> {
    DEFAULT_PRECACHE.iter().map(|p| p.to_string()).collect()
}

fn default_fallback_path() -> String {
    "/index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_precache_concurrency() -> usize {
    6
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_version: default_cache_version(),
            precache: default_precache(),
            fallback_path: default_fallback_path(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            precache_concurrency: default_precache_concurrency(),
            skip_waiting: true,
            claim_clients: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://localhost:8080");
        assert_eq!(config.cache_version, "svityazhome-v12");
        assert_eq!(config.fallback_path, "/index.html");
        assert_eq!(config.db_path, PathBuf::from("./swcache.sqlite"));
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.precache_concurrency, 6);
        assert!(config.skip_waiting);
        assert!(config.claim_clients);
    }

    #[test]
    fn test_default_manifest_contains_shell() {
        let config = AppConfig::default();
        for path in ["/", "/index.html", "/404.html", "/assets/css/style.css", "/assets/js/main.js"] {
            assert!(config.precache.iter().any(|p| p == path), "missing {path}");
        }
        assert!(config.precache.iter().any(|p| p.ends_with("site.webmanifest")));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_load_layers_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "swcache.toml",
                r#"
                origin = "https://svityazhome.example"
                cache_version = "svityazhome-v13"
                precache = ["/", "/index.html"]
                "#,
            )?;
            jail.set_env("SWCACHE_CONFIG_FILE", "swcache.toml");
            jail.set_env("SWCACHE_CACHE_VERSION", "svityazhome-v14");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.origin, "https://svityazhome.example");
            assert_eq!(config.cache_version, "svityazhome-v14");
            assert_eq!(config.precache, vec!["/", "/index.html"]);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SWCACHE_FALLBACK_PATH", "/offline.html");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
