//! The `cloud-config.json` deployment file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

pub const CLOUD_CONFIG_FILE: &str = "cloud-config.json";

/// Keys with a fixed meaning; everything else is a static pair.
pub const RESERVED_KEYS: [&str; 3] = ["env", "stacks", "ignore"];

/// Parsed deployment configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployConfig {
    pub environment: String,
    /// Stacks to operate on, in file order.
    pub stacks: Vec<String>,
    /// Output keys left out of the output table.
    pub ignore: Vec<String>,
    /// Non-reserved top-level pairs, in file order.
    pub static_pairs: Map<String, Value>,
}

impl DeployConfig {
    /// Load from a `cloud-config.json` file or a directory containing one.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = Self::resolve(path.as_ref());
        if !path.is_file() {
            return Err(ConfigError::NotFound(path));
        }

        debug!("Reading deploy config from {:?}", path);
        let content = fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(value, &path)
    }

    fn resolve(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(CLOUD_CONFIG_FILE)
        } else {
            path.to_path_buf()
        }
    }

    /// Build from parsed JSON. `source` is only used in error messages.
    pub fn from_value(value: Value, source: &Path) -> ConfigResult<Self> {
        let Value::Object(mut object) = value else {
            return Err(ConfigError::InvalidValue {
                key: source.display().to_string(),
                message: "expected a JSON object".to_string(),
            });
        };

        let missing = |key: &str| ConfigError::MissingKey {
            path: source.to_path_buf(),
            key: key.to_string(),
        };

        let environment = match object.remove("env") {
            Some(Value::String(env)) => env,
            Some(_) => return Err(invalid("env", "expected a string")),
            None => return Err(missing("env")),
        };

        let stacks = match object.remove("stacks") {
            Some(value) => string_list("stacks", value)?,
            None => return Err(missing("stacks")),
        };

        let ignore = match object.remove("ignore") {
            Some(value) => string_list("ignore", value)?,
            None => Vec::new(),
        };

        Ok(Self {
            environment,
            stacks,
            ignore,
            static_pairs: object,
        })
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore.iter().any(|k| k == key)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn string_list(key: &str, value: Value) -> ConfigResult<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(invalid(key, "expected a list of strings"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(invalid(key, "expected a list of strings")),
        })
        .collect()
}
