//! Client configuration.
//!
//! # Invariants
//! - Table names and the application key are non-blank after validation.
//! - `open_timeout_ms` is strictly positive; waiting is always bounded.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_OPEN_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid client config: {err}"),
            Self::Invalid(message) => write!(f, "invalid client config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
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

/// Settings used to wire the store client and repositories.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Application key registered with the store provider.
    pub app_key: String,
    pub folders_table: String,
    pub notes_table: String,
    pub settings_table: String,
    /// Upper bound for `deferred_*` operations waiting on the store handle.
    pub open_timeout_ms: u64,
    /// Whether authentication may prompt the user.
    pub interactive_auth: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_key: "cloudnote-local".to_string(),
            folders_table: "folders".to_string(),
            notes_table: "notes".to_string(),
            settings_table: "setting".to_string(),
            open_timeout_ms: DEFAULT_OPEN_TIMEOUT_MS,
            interactive_auth: true,
        }
    }
}

impl ClientConfig {
    /// Parses a JSON document; missing keys fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("app_key", &self.app_key),
            ("folders_table", &self.folders_table),
            ("notes_table", &self.notes_table),
            ("settings_table", &self.settings_table),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("`{key}` must not be blank")));
            }
        }
        if self.open_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "`open_timeout_ms` must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientConfig, ConfigError};

    #[test]
    fn empty_document_uses_defaults() {
        let config = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.settings_table, "setting");
    }

    #[test]
    fn partial_document_overrides_selected_keys() {
        let config =
            ClientConfig::from_json_str(r#"{"app_key":"abc","open_timeout_ms":250}"#).unwrap();
        assert_eq!(config.app_key, "abc");
        assert_eq!(config.open_timeout().as_millis(), 250);
        assert_eq!(config.notes_table, "notes");
    }

    #[test]
    fn rejects_blank_table_and_zero_timeout() {
        let err = ClientConfig::from_json_str(r#"{"notes_table":"  "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("notes_table")));

        let err = ClientConfig::from_json_str(r#"{"open_timeout_ms":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ClientConfig::from_json_str(r#"{"tables":"x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
