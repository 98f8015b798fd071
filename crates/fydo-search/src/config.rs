//! # Fydo Configuration
//!
//! Configuration for the OpenFoodFacts client, the search pipeline and the
//! local cache.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FYDO_API_URL=https://fr.openfoodfacts.org                          │
//! │     FYDO_MIN_RESULTS=40                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/fydo/fydo.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.fydo.fydo/fydo.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     world.openfoodfacts.org, 20 results, 5 pages, 30-day cache         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # fydo.toml
//! [api]
//! base_url = "https://world.openfoodfacts.org"
//! user_agent = "fydo/0.1.0"
//! timeout_secs = 10
//!
//! [search]
//! page_size = 20
//! filtered_page_size = 100
//! min_results = 20
//! max_pages = 5
//!
//! [cache]
//! database_path = "/var/lib/fydo/fydo.db"
//! freshness_days = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use fydo_core::{
    SearchOptions, CACHE_FRESHNESS_DAYS, DEFAULT_MAX_PAGES, DEFAULT_MIN_RESULTS,
    DEFAULT_PAGE_SIZE, FILTERED_PAGE_SIZE, MAX_FRESHNESS_DAYS, MAX_PAGES_CEILING, MAX_PAGE_SIZE,
};

use crate::error::{SearchError, SearchResult};

// =============================================================================
// API Settings
// =============================================================================

/// Settings for the OpenFoodFacts HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the OpenFoodFacts instance.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent sent with every request. OpenFoodFacts asks clients to
    /// identify themselves.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://world.openfoodfacts.org".to_string()
}

fn default_user_agent() -> String {
    format!("fydo/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiSettings {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Search Settings
// =============================================================================

/// Default paging bounds for name searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Page size for unfiltered searches.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Page size for every fetch while an ingredient filter is active.
    #[serde(default = "default_filtered_page_size")]
    pub filtered_page_size: u32,

    /// Stop paging once this many matches are collected.
    #[serde(default = "default_min_results")]
    pub min_results: u32,

    /// Ceiling on upstream requests per search.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_filtered_page_size() -> u32 {
    FILTERED_PAGE_SIZE
}
fn default_min_results() -> u32 {
    DEFAULT_MIN_RESULTS
}
fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            page_size: default_page_size(),
            filtered_page_size: default_filtered_page_size(),
            min_results: default_min_results(),
            max_pages: default_max_pages(),
        }
    }
}

impl SearchSettings {
    /// Builds search options starting at `start_page`.
    pub fn options(&self, start_page: u32) -> SearchOptions {
        SearchOptions {
            start_page,
            page_size: self.page_size,
            min_results: self.min_results,
            max_pages: self.max_pages,
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Settings for the local product cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// SQLite file. Falls back to the platform data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Records younger than this are served without a network call.
    #[serde(default = "default_freshness_days")]
    pub freshness_days: i64,
}

fn default_freshness_days() -> i64 {
    CACHE_FRESHNESS_DAYS
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            database_path: None,
            freshness_days: default_freshness_days(),
        }
    }
}

impl CacheSettings {
    /// Freshness window as a chrono duration.
    ///
    /// ## Errors
    /// `InvalidConfig` when `freshness_days` is negative or above
    /// [`MAX_FRESHNESS_DAYS`].
    pub fn freshness_window(&self) -> SearchResult<chrono::Duration> {
        if !(0..=MAX_FRESHNESS_DAYS).contains(&self.freshness_days) {
            return Err(SearchError::InvalidConfig(format!(
                "freshness_days must be between 0 and {}",
                MAX_FRESHNESS_DAYS
            )));
        }
        chrono::Duration::try_days(self.freshness_days).ok_or_else(|| {
            SearchError::InvalidConfig(format!(
                "freshness_days out of range: {}",
                self.freshness_days
            ))
        })
    }

    /// Configured database path, or `fydo.db` in the platform data directory.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "fydo", "fydo")
                .map(|dirs| dirs.data_dir().join("fydo.db"))
        })
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete Fydo configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FydoConfig {
    /// OpenFoodFacts client settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Search paging defaults.
    #[serde(default)]
    pub search: SearchSettings,

    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
}

impl FydoConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (fydo.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SearchResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
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
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SearchResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SearchError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SearchResult<()> {
        let url = url::Url::parse(&self.api.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SearchError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(SearchError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        for (name, size) in [
            ("page_size", self.search.page_size),
            ("filtered_page_size", self.search.filtered_page_size),
        ] {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(SearchError::InvalidConfig(format!(
                    "{} must be between 1 and {}",
                    name, MAX_PAGE_SIZE
                )));
            }
        }

        if self.search.max_pages == 0 || self.search.max_pages > MAX_PAGES_CEILING {
            return Err(SearchError::InvalidConfig(format!(
                "max_pages must be between 1 and {}",
                MAX_PAGES_CEILING
            )));
        }

        self.cache.freshness_window()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FYDO_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(agent) = std::env::var("FYDO_USER_AGENT") {
            self.api.user_agent = agent;
        }

        if let Ok(timeout) = std::env::var("FYDO_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.api.timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric FYDO_TIMEOUT_SECS"),
            }
        }

        if let Ok(size) = std::env::var("FYDO_PAGE_SIZE") {
            if let Ok(s) = size.parse::<u32>() {
                self.search.page_size = s;
            }
        }

        if let Ok(min) = std::env::var("FYDO_MIN_RESULTS") {
            if let Ok(m) = min.parse::<u32>() {
                debug!(min_results = m, "Overriding min results from environment");
                self.search.min_results = m;
            }
        }

        if let Ok(pages) = std::env::var("FYDO_MAX_PAGES") {
            if let Ok(p) = pages.parse::<u32>() {
                self.search.max_pages = p;
            }
        }

        if let Ok(days) = std::env::var("FYDO_FRESHNESS_DAYS") {
            if let Ok(d) = days.parse::<i64>() {
                self.cache.freshness_days = d;
            }
        }

        if let Ok(path) = std::env::var("FYDO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.cache.database_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "fydo", "fydo")
            .map(|dirs| dirs.config_dir().join("fydo.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FydoConfig::default();
        assert_eq!(config.api.base_url, "https://world.openfoodfacts.org");
        assert_eq!(config.search.filtered_page_size, 100);
        assert_eq!(config.search.min_results, 20);
        assert_eq!(config.search.max_pages, 5);
        assert_eq!(config.cache.freshness_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = FydoConfig::default();

        config.api.base_url = "ftp://openfoodfacts.org".to_string();
        assert!(config.validate().unwrap_err().is_config_error());

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config = FydoConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        config = FydoConfig::default();
        config.search.filtered_page_size = 0;
        assert!(config.validate().is_err());

        config = FydoConfig::default();
        config.search.max_pages = 0;
        assert!(config.validate().is_err());

        config = FydoConfig::default();
        config.cache.freshness_days = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_freshness_days_is_rejected() {
        let mut config = FydoConfig::default();
        config.cache.freshness_days = i64::MAX;

        assert!(config.validate().unwrap_err().is_config_error());
        assert!(config.cache.freshness_window().is_err());

        config.cache.freshness_days = MAX_FRESHNESS_DAYS;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.cache.freshness_window().unwrap(),
            chrono::Duration::days(MAX_FRESHNESS_DAYS)
        );
    }

    #[test]
    fn test_huge_freshness_days_from_toml_fails_validation() {
        let config: FydoConfig = toml::from_str(
            r#"
            [cache]
            freshness_days = 9223372036854775807
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: FydoConfig = toml::from_str(
            r#"
            [search]
            min_results = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.search.min_results, 40);
        assert_eq!(config.search.page_size, 20);
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("fydo-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("fydo.toml");

        let mut config = FydoConfig::default();
        config.api.base_url = "https://fr.openfoodfacts.org".to_string();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[api]"));
        assert!(contents.contains("[search]"));

        let loaded: FydoConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_search_options_from_settings() {
        let options = SearchSettings::default().options(3);
        assert_eq!(options.start_page, 3);
        assert_eq!(options.page_size, 20);
    }
}
