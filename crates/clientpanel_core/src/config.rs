//! Runtime configuration for the client panel core.
//!
//! # Responsibility
//! - Describe storage, logging, paging and admin-seed settings.
//! - Layer sources: built-in defaults, optional JSON file, environment.
//!
//! # Invariants
//! - A config returned by `load` has passed `validate()`.
//! - Missing keys in a JSON file fall back to defaults.

use crate::bootstrap::AdminSeed;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE_NAME: &str = "clientpanel.sqlite3";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const ENV_DB_PATH: &str = "CLIENTPANEL_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CLIENTPANEL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CLIENTPANEL_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "CLIENTPANEL_PAGE_SIZE";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientPanelConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. File logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// Page size used by list views.
    pub page_size: u32,
    /// Account provisioned into an empty store.
    pub admin: AdminSeed,
}

impl Default for ClientPanelConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
            admin: AdminSeed::default(),
        }
    }
}

impl ClientPanelConfig {
    /// Loads defaults, then `path` when given, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Applies `CLIENTPANEL_*` overrides resolved through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = read(ENV_DB_PATH) {
            self.db_path = PathBuf::from(value.trim());
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            self.log_level = value.trim().to_string();
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = read(ENV_PAGE_SIZE) {
            self.page_size = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_PAGE_SIZE} must be a positive integer"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if let Some(dir) = self.log_dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        self.admin
            .to_new_client()
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("admin seed: {err}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientPanelConfig, ConfigError, DEFAULT_PAGE_SIZE, ENV_PAGE_SIZE};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        let config = ClientPanelConfig::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.log_dir.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_keys() {
        let config =
            ClientPanelConfig::from_json_str(r#"{ "db_path": "/tmp/cp.sqlite3", "page_size": 25 }"#)
                .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/cp.sqlite3"));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.admin.client_id, "test001");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ClientPanelConfig::from_json_str(r#"{ "pagesize": 5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_replace_values_and_skip_blanks() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CLIENTPANEL_DB_PATH", "/data/clients.db"),
            ("CLIENTPANEL_LOG_LEVEL", "  "),
            ("CLIENTPANEL_PAGE_SIZE", "50"),
        ]);
        let mut config = ClientPanelConfig::default();
        let default_level = config.log_level.clone();
        config
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/clients.db"));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.log_level, default_level);
    }

    #[test]
    fn non_numeric_page_size_override_fails() {
        let mut config = ClientPanelConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_PAGE_SIZE).then(|| "ten".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_PAGE_SIZE));
    }

    #[test]
    fn validate_rejects_out_of_range_page_size_and_relative_log_dir() {
        let mut config = ClientPanelConfig {
            page_size: 0,
            ..ClientPanelConfig::default()
        };
        assert!(config.validate().is_err());

        config.page_size = 10;
        config.log_dir = Some(PathBuf::from("logs/dev"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }
}
