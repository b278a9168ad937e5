//! Configuration for the registry and the debug endpoint.
//!
//! Loaded from a TOML file and optionally overlaid by `TASKSCOPE_*`
//! environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::RetentionPolicy;

/// Environment variable overriding [`TaskscopeConfig::enabled`].
pub const ENV_ENABLED: &str = "TASKSCOPE_ENABLED";
/// Environment variable overriding [`ServerConfig::listen`].
pub const ENV_LISTEN: &str = "TASKSCOPE_LISTEN";

/// Default address of the debug endpoint.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:7070";
/// Default route serving the snapshot array.
pub const DEFAULT_PATH: &str = "/debug/obs";

/// Complete taskscope configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskscopeConfig {
    /// Whether task tracking starts enabled
    pub enabled: bool,
    /// Debug endpoint settings
    pub server: ServerConfig,
    /// Registry retention settings
    pub retention: RetentionConfig,
}

impl Default for TaskscopeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server: ServerConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// Debug endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub listen: String,
    /// Route serving the snapshot array; must start with `/`
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_owned(),
            path: DEFAULT_PATH.to_owned(),
        }
    }
}

/// Registry retention configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Maximum number of completed tasks kept; unset keeps every task forever
    pub max_completed: Option<usize>,
}

impl RetentionConfig {
    /// Retention policy described by this section.
    pub fn policy(&self) -> RetentionPolicy {
        self.max_completed
            .map_or(RetentionPolicy::KeepAll, RetentionPolicy::MaxCompleted)
    }
}

impl TaskscopeConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document is not valid TOML or fails validation.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads config from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(
            "Loaded taskscope config from {:?}: enabled={}, listen={}",
            path, config.enabled, config.server.listen
        );
        Ok(config)
    }

    /// Overlays values from the process environment.
    ///
    /// # Errors
    /// Returns an error if an override is malformed.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    /// Overlays values from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if `TASKSCOPE_ENABLED` is not a boolean or the result
    /// fails validation.
    pub fn apply_env_from<Lookup>(mut self, lookup: Lookup) -> Result<Self>
    where
        Lookup: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ENABLED) {
            self.enabled = parse_flag(&raw).ok_or_else(|| {
                Error::Config(format!("{ENV_ENABLED} must be a boolean, got {raw:?}"))
            })?;
        }
        if let Some(listen) = lookup(ENV_LISTEN) {
            self.server.listen = listen;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks invariants the server relies on.
    ///
    /// # Errors
    /// Returns an error if the listen address is empty or the path does not
    /// start with `/`.
    pub fn validate(&self) -> Result<()> {
        if self.server.listen.trim().is_empty() {
            return Err(Error::Config("server.listen must not be empty".to_owned()));
        }
        if !self.server.path.starts_with('/') {
            return Err(Error::Config(format!(
                "server.path must start with '/', got {:?}",
                self.server.path
            )));
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TaskscopeConfig::default();
        assert!(config.enabled);
        assert_eq!(config.server.listen, DEFAULT_LISTEN);
        assert_eq!(config.server.path, DEFAULT_PATH);
        assert_eq!(config.retention.policy(), RetentionPolicy::KeepAll);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = TaskscopeConfig::from_toml_str("enabled = false\n").expect("parse config");
        assert!(!config.enabled);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let toml_content = r#"
enabled = true

[server]
listen = "0.0.0.0:9090"
path = "/tasks"

[retention]
max_completed = 500
"#;
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file
            .write_all(toml_content.as_bytes())
            .expect("Failed to write to temp file");

        let config =
            TaskscopeConfig::load_from_file(temp_file.path()).expect("Failed to load config");
        assert_eq!(config.server.listen, "0.0.0.0:9090");
        assert_eq!(config.server.path, "/tasks");
        assert_eq!(config.retention.policy(), RetentionPolicy::MaxCompleted(500));
    }

    #[test]
    fn test_invalid_path_rejected() {
        let error = TaskscopeConfig::from_toml_str("[server]\npath = \"tasks\"\n").unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let error = TaskscopeConfig::from_toml_str("enabled = maybe").unwrap_err();
        assert!(matches!(error, Error::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            (ENV_ENABLED, "off".to_owned()),
            (ENV_LISTEN, "127.0.0.1:0".to_owned()),
        ]);
        let config = TaskscopeConfig::default()
            .apply_env_from(|key| vars.get(key).cloned())
            .expect("apply env");
        assert!(!config.enabled);
        assert_eq!(config.server.listen, "127.0.0.1:0");
    }

    #[test]
    fn test_env_bad_flag_rejected() {
        let error = TaskscopeConfig::default()
            .apply_env_from(|key| (key == ENV_ENABLED).then(|| "sometimes".to_owned()))
            .unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }
}
