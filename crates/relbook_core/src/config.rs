//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - An unparsable value is an error, never silently replaced.

use crate::logging::{default_log_level, normalize_level, LogTarget};
use crate::service::query::DEFAULT_PER_PAGE;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "RELBOOK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "RELBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "RELBOOK_LOG_DIR";
pub const ENV_PER_PAGE: &str = "RELBOOK_PER_PAGE";

const DEFAULT_DB_FILE_NAME: &str = "relbook.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidPerPage(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(value) => {
                write!(f, "{ENV_LOG_LEVEL}: unsupported level `{value}`")
            }
            Self::InvalidPerPage(value) => write!(
                f,
                "{ENV_PER_PAGE}: expected a positive integer, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file backing the persisted store.
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Rotating log directory; `None` leaves file logging off.
    pub log_dir: Option<PathBuf>,
    /// Page size used when a caller gives none.
    pub default_per_page: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl CoreConfig {
    /// Reads `RELBOOK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|_| ConfigError::InvalidLogLevel(level))?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = read(ENV_PER_PAGE) {
            config.default_per_page = match raw.parse::<u32>() {
                Ok(value) if value >= 1 => value,
                _ => return Err(ConfigError::InvalidPerPage(raw)),
            };
        }

        Ok(config)
    }

    /// Logging destination implied by this config.
    pub fn log_target(&self) -> LogTarget {
        match &self.log_dir {
            Some(dir) => LogTarget::Dir(dir.clone()),
            None => LogTarget::Stderr,
        }
    }
}
