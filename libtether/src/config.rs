//! Bootstrap configuration for Tether
//!
//! A config file describes the initial state tree and the declared action
//! names, so an application can build its containers from one place:
//!
//! ```toml
//! [state]
//! theme = "dark"
//!
//! [actions]
//! login = {}
//! logout = {}
//! ```

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::actions::ActionRegistry;
use crate::error::{ConfigError, Result};
use crate::state::StateContainer;
use crate::value::{Mapping, Value};

/// Read-only bootstrap description; nothing writes it back out, since TOML
/// has no way to spell the `Null` leaves a state tree may hold
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Initial state tree
    #[serde(default = "Value::empty_mapping", deserialize_with = "toml_value")]
    pub state: Value,

    /// Declared actions; only the keys matter
    #[serde(default, deserialize_with = "toml_table")]
    pub actions: Mapping,
}

// go through toml's own value type so datetimes arrive as datetimes rather
// than as the private wrapper table the toml deserializer uses for them
fn toml_value<'de, D>(deserializer: D) -> std::result::Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    toml::Value::deserialize(deserializer).map(Value::from)
}

fn toml_table<'de, D>(deserializer: D) -> std::result::Result<Mapping, D::Error>
where
    D: Deserializer<'de>,
{
    let table = toml::Table::deserialize(deserializer)?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state: Value::empty_mapping(),
            actions: Mapping::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        if !config.state.is_mapping() {
            return Err(ConfigError::InvalidField(format!(
                "state must be a table, got {}",
                config.state.kind()
            ))
            .into());
        }
        Ok(config)
    }

    /// Build a state container holding the configured initial state
    pub fn build_state(&self) -> StateContainer {
        StateContainer::new(Some(self.state.clone()))
    }

    /// Build an action registry declaring the configured actions
    pub fn build_registry(&self) -> ActionRegistry {
        ActionRegistry::from_spec(&self.actions)
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TETHER_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("tether").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TetherError;
    use serial_test::serial;

    #[test]
    fn test_parse_state_and_actions() {
        let config = Config::from_toml_str(
            r#"
            [state]
            theme = "dark"

            [state.session]
            user = "ada"
            roles = ["admin"]

            [actions]
            login = {}
            logout = true
            "#,
        )
        .unwrap();

        assert_eq!(config.state.get("theme").and_then(Value::as_str), Some("dark"));
        assert_eq!(
            config.state.pointer("/session/roles/0").and_then(Value::as_str),
            Some("admin")
        );
        assert_eq!(
            config.actions.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["login", "logout"]
        );
    }

    #[test]
    fn test_datetime_state_becomes_string() {
        let config = Config::from_toml_str(
            r#"
            [state]
            when = 1979-05-27T07:32:00Z
            day = 1979-05-27

            [state.nested]
            at = 07:32:00
            "#,
        )
        .unwrap();

        assert_eq!(
            config.state.get("when").and_then(Value::as_str),
            Some("1979-05-27T07:32:00Z")
        );
        assert_eq!(config.state.get("day").and_then(Value::as_str), Some("1979-05-27"));
        assert_eq!(
            config.state.pointer("/nested/at").and_then(Value::as_str),
            Some("07:32:00")
        );
        assert!(!config.state.to_string().contains("$__toml_private_datetime"));
    }

    #[test]
    fn test_table_order_is_preserved() {
        let config = Config::from_toml_str("[state]
zeta = 1
alpha = 2
mid = 3
").unwrap();

        let keys: Vec<&str> = config
            .state
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config.state, Value::empty_mapping());
        assert!(config.actions.is_empty());
    }

    #[test]
    fn test_non_table_state_is_rejected() {
        let err = Config::from_toml_str("state = 3").unwrap_err();
        assert!(matches!(
            err,
            TetherError::Config(ConfigError::InvalidField(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Config::from_toml_str("[state").unwrap_err();
        assert!(matches!(err, TetherError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_build_state_and_registry() {
        let config = Config::from_toml_str("[state]\ncount = 1\n[actions]\nincrement = {}\n").unwrap();

        let store = config.build_state();
        let registry = config.build_registry();

        assert_eq!(store.state().get("count").and_then(Value::as_i64), Some(1));
        assert!(registry.contains("increment"));
        assert!(!registry.contains("count"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_from_env() {
        std::env::set_var("TETHER_CONFIG", "/tmp/tether-test/config.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("TETHER_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/tether-test/config.toml"));
    }
}
