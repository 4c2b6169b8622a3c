//! Site configuration
//!
//! Settings come from an optional TOML file, then `FOLIO_*` environment
//! variables. Every field has a default, so an empty or missing file yields a
//! site that renders entirely from fallbacks.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::aggregate::Aggregator;
use crate::cache::{CacheStore, CACHE_VERSION};
use crate::content::standard_catalog;
use crate::resolve::{SectionResolver, StaticDefaults};
use crate::source::{HttpSource, NoSource, PrimarySource, SqliteSource};

/// Environment variable overriding `cache_dir`
pub const ENV_CACHE_DIR: &str = "FOLIO_CACHE_DIR";
/// Environment variable overriding `defaults_dir`
pub const ENV_DEFAULTS_DIR: &str = "FOLIO_DEFAULTS_DIR";
/// Environment variable overriding `database_path`
pub const ENV_DATABASE: &str = "FOLIO_DATABASE";
/// Environment variable overriding `log.level`
pub const ENV_LOG_LEVEL: &str = "FOLIO_LOG_LEVEL";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("failed to build content API client: {0}")]
    Client(String),
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    /// JSON-lines log file; stderr only when unset
    pub file: Option<PathBuf>,
    /// Size at which the log file is rotated
    pub max_bytes: u64,
    /// Rotated files kept
    pub keep_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            max_bytes: 5 * 1024 * 1024,
            keep_files: 5,
        }
    }
}

/// Everything needed to build the resolution stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub cache_dir: PathBuf,
    /// Version tag prefixed to cache keys and default directories
    pub cache_version: String,
    pub default_ttl_secs: u64,
    /// Root of the `<version>/<section>.json` static defaults
    pub defaults_dir: Option<PathBuf>,
    /// SQLite content database
    pub database_path: Option<PathBuf>,
    /// JSON content API, used when no database is configured
    pub content_api_url: Option<String>,
    pub request_timeout_secs: u64,
    pub log: LogConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            cache_version: CACHE_VERSION.to_string(),
            default_ttl_secs: 3600,
            defaults_dir: None,
            database_path: None,
            content_api_url: None,
            request_timeout_secs: 10,
            log: LogConfig::default(),
        }
    }
}

/// XDG cache directory, or a temp directory when there is no home
fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "folio")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("folio-cache"))
}

impl SiteConfig {
    /// Loads the config file (if any) and applies environment overrides
    ///
    /// # Arguments
    /// * `path` - TOML file; a path that does not exist yields the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Reads a TOML file without applying environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides read through `lookup`
    ///
    /// Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_CACHE_DIR) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_DEFAULTS_DIR) {
            self.defaults_dir = Some(PathBuf::from(dir));
        }
        if let Some(db) = get(ENV_DATABASE) {
            self.database_path = Some(PathBuf::from(db));
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log.level = level.parse().map_err(|_| ConfigError::InvalidValue {
                name: ENV_LOG_LEVEL,
                value: level.clone(),
            })?;
        }
        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn cache_store(&self) -> CacheStore {
        CacheStore::with_dir(self.cache_dir.clone())
            .with_version(self.cache_version.clone())
            .with_default_ttl(self.default_ttl())
    }

    pub fn static_defaults(&self) -> StaticDefaults {
        match &self.defaults_dir {
            Some(dir) => StaticDefaults::new(dir, self.cache_version.clone()),
            None => StaticDefaults::unconfigured(),
        }
    }

    /// The configured primary source
    ///
    /// The database wins over the content API. With neither configured every
    /// query reports the source as unavailable.
    pub fn primary_source(&self) -> Result<Box<dyn PrimarySource>, ConfigError> {
        if let Some(db) = &self.database_path {
            return Ok(Box::new(SqliteSource::open_lazy(db)));
        }
        if let Some(url) = &self.content_api_url {
            let timeout = Duration::from_secs(self.request_timeout_secs);
            let source =
                HttpSource::new(url, timeout).map_err(|e| ConfigError::Client(e.to_string()))?;
            return Ok(Box::new(source));
        }
        Ok(Box::new(NoSource))
    }

    /// Aggregator over the standard catalog
    pub fn aggregator(&self) -> Result<Aggregator<Box<dyn PrimarySource>>, ConfigError> {
        let resolver = SectionResolver::new(
            self.cache_store(),
            self.primary_source()?,
            self.static_defaults(),
        );
        Ok(Aggregator::new(resolver, standard_catalog()))
    }
}
