//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OCACHE_*)
//! 2. TOML config file (if OCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::manifest::AssetManifest;
use crate::request::ResourceId;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OCACHE_*)
/// 2. TOML config file (if OCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL that relative asset identifiers resolve against.
    ///
    /// Set via OCACHE_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Tag of the active cache generation. Bump it to roll out a new version.
    ///
    /// Set via OCACHE_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Resources pre-populated at install, in order.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Document served for uncached navigations while offline.
    #[serde(default = "default_app_shell")]
    pub app_shell: String,

    /// Entry served for uncached sub-resources while offline.
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Generic offline notice, the last cached tier before a 503.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Path to SQLite cache database.
    ///
    /// Set via OCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via OCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via OCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds, enforced by the transport.
    ///
    /// Set via OCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_generation() -> String {
    "webar-cache-v1".into()
}

fn default_assets() -> Vec<String> {
    ["./", "./index.html", "./nav.html", "./manifest.json", "./offline.html", "./assets/hiro_preview.svg"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_app_shell() -> String {
    "./index.html".into()
}

fn default_root_path() -> String {
    "./".into()
}

fn default_offline_page() -> String {
    "./offline.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ocache-cache.sqlite")
}

fn default_user_agent() -> String {
    "ocache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            generation: default_generation(),
            assets: default_assets(),
            app_shell: default_app_shell(),
            root_path: default_root_path(),
            offline_page: default_offline_page(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OCACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed scope URL.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// The asset manifest resolved against the scope.
    pub fn manifest(&self) -> Result<AssetManifest, ConfigError> {
        let scope = self.scope_url()?;
        AssetManifest::resolve(&scope, self.assets.as_slice())
            .map_err(|e| ConfigError::Invalid { field: "assets".into(), reason: e.to_string() })
    }

    /// The fallback identities used by the strategy engine.
    pub fn fallbacks(&self) -> Result<FallbackTargets, ConfigError> {
        let scope = self.scope_url()?;
        let resolve = |field: &str, value: &str| {
            ResourceId::resolve(&scope, value)
                .map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })
        };

        Ok(FallbackTargets {
            app_shell: resolve("app_shell", &self.app_shell)?,
            root_path: resolve("root_path", &self.root_path)?,
            offline_page: resolve("offline_page", &self.offline_page)?,
        })
    }
}

/// Cached identities tried, in tiers, when the network cannot answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTargets {
    /// Navigation tier 2.
    pub app_shell: ResourceId,
    /// Sub-resource tier 1.
    pub root_path: ResourceId,
    /// Last cached tier for both classes.
    pub offline_page: ResourceId,
}
