//! Configuration management for keysmith.
//!
//! This module provides multi-layer configuration support with:
//! - File-based configuration (the repository marker file)
//! - Environment variable overrides
//!
//! ## Configuration Layers
//!
//! Configuration values are resolved in this priority order:
//! 1. Environment variables (`KEYSMITH_*`)
//! 2. Values loaded from file
//! 3. Default values
//!
//! ## Example
//!
//! ```no_run
//! use keysmith_core::config::RepoConfig;
//!
//! // Load the repository configuration from the current directory
//! let config = RepoConfig::load(".")?;
//! println!("hosts live in {}", config.hosts_dir.display());
//! # Ok::<(), keysmith_types::KeysmithError>(())
//! ```

use keysmith_types::{KeysmithError, Result};
use keysmith_types::config::{LogConfig, SealerConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::fs;

/// Name of the file marking a keysmith repository root.
pub const MARKER_FILE: &str = "keysmith.yml";

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "KEYSMITH_";

/// Configuration layer priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigLayer {
    /// Default values
    Default = 0,
    /// Values loaded from file
    Loaded = 1,
    /// Values from environment variables
    Environment = 2,
}

const LOWEST_FIRST: [ConfigLayer; 3] = [
    ConfigLayer::Default,
    ConfigLayer::Loaded,
    ConfigLayer::Environment,
];

/// Layered configuration value store.
///
/// This is the low-level configuration type; `RepoConfig` is the typed
/// view the rest of keysmith uses.
#[derive(Clone, Debug, Default)]
pub struct Config {
    layers: HashMap<ConfigLayer, Value>,
}

impl Config {
    /// Create a new configuration from a file path.
    ///
    /// If the file doesn't exist, an empty configuration is created.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut layers = HashMap::new();

        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| KeysmithError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

            let value: Value = serde_yaml::from_str(&content)
                .map_err(|e| KeysmithError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

            // An empty file parses as null
            if !value.is_null() {
                layers.insert(ConfigLayer::Loaded, value);
            }
        }

        Ok(Self { layers })
    }

    /// Install default values.
    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.layers.insert(ConfigLayer::Default, defaults);
        self
    }

    /// Populate the environment layer from variables carrying `prefix`.
    ///
    /// `KEYSMITH_HOSTS_DIR` sets `hosts_dir`; a double underscore nests, so
    /// `KEYSMITH_SEALER__DECRYPT` sets `sealer.decrypt`. Values are parsed
    /// as YAML, so lists can be written inline (`[rage, -d]`).
    pub fn with_env<I>(mut self, prefix: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env_layer = Value::Object(Default::default());
        for (key, raw) in vars {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let dotted = rest.to_lowercase().replace("__", ".");
            let value: Value = serde_yaml::from_str(&raw)
                .unwrap_or(Value::String(raw.clone()));
            Self::set_value_at_path(&mut env_layer, &dotted, value)?;
        }
        if env_layer.as_object().is_some_and(|m| !m.is_empty()) {
            self.layers.insert(ConfigLayer::Environment, env_layer);
        }
        Ok(self)
    }

    /// Get merged data from all layers.
    pub fn merged_data(&self) -> Value {
        let mut merged = Value::Object(serde_json::Map::new());

        for layer in &LOWEST_FIRST {
            if let Some(layer_data) = self.layers.get(layer) {
                merged = crate::util::data::deep_merge(merged, layer_data.clone());
            }
        }

        merged
    }

    fn set_value_at_path(data: &mut Value, path: &str, value: Value) -> Result<()> {
        let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();

        let Some((last, parents)) = parts.split_last() else {
            return Err(KeysmithError::Config("Empty configuration key".to_string()));
        };

        // Navigate to parent, creating intermediate objects as needed
        let mut current = data;
        for part in parents {
            if !current.is_object() {
                *current = Value::Object(Default::default());
            }
            let Value::Object(map) = current else {
                return Err(KeysmithError::Bug(format!("'{}' is not a mapping", part)));
            };
            current = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
        }

        match current {
            Value::Object(obj) => {
                obj.insert(last.to_string(), value);
                Ok(())
            }
            _ => Err(KeysmithError::Config(format!(
                "Cannot set '{}': parent is not a mapping",
                path
            ))),
        }
    }
}

/// Repository configuration (`keysmith.yml` at the repository root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Directory holding one `<host>.yml` file per host
    pub hosts_dir: PathBuf,

    /// Encryption commands
    pub sealer: SealerConfig,

    /// Interpreter argv used to run generator scripts
    pub shell: Vec<String>,

    /// Extra log outputs
    #[serde(default)]
    pub logs: Vec<LogConfig>,
}

fn defaults() -> Value {
    serde_json::json!({
        "hosts_dir": "hosts",
        "shell": ["sh", "-c"],
        "logs": [],
    })
}

impl RepoConfig {
    /// Load repository configuration from `<root>/keysmith.yml`, applying
    /// `KEYSMITH_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Fails if the marker file is absent: keysmith must run from the
    /// repository root.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(root, std::env::vars())
    }

    /// Like [`RepoConfig::load`] with an explicit environment.
    pub fn load_with_env<I>(root: impl AsRef<Path>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = root.as_ref().join(MARKER_FILE);
        if !marker.is_file() {
            return Err(KeysmithError::Config(format!(
                "{} not found in {}; keysmith must be run from the repository root",
                MARKER_FILE,
                root.as_ref().display()
            )));
        }

        let config = Config::load(&marker)?
            .with_defaults(defaults())
            .with_env(ENV_PREFIX, vars)?;
        let repo_config: RepoConfig = serde_json::from_value(config.merged_data())
            .map_err(|e| KeysmithError::Config(format!("Failed to parse {}: {}", marker.display(), e)))?;
        repo_config.validate()?;
        Ok(repo_config)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.sealer.encrypt.is_empty() {
            return Err(KeysmithError::Config("sealer.encrypt must name a command".to_string()));
        }
        if self.sealer.decrypt.is_empty() {
            return Err(KeysmithError::Config("sealer.decrypt must name a command".to_string()));
        }
        if self.shell.is_empty() {
            return Err(KeysmithError::Config("shell must name an interpreter".to_string()));
        }
        Ok(())
    }
}
