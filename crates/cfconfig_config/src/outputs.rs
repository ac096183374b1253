//! Output table assembled from static config and stack outputs.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::cloud_config::DeployConfig;
use crate::error::{ConfigError, ConfigResult};

/// Source name for pairs that come from the config file itself.
pub const STATIC_SOURCE: &str = "static";

/// Flat `<source>_<key>` table of configuration values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    entries: Map<String, Value>,
    ignore: Vec<String>,
}

impl OutputTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the static pairs of `config`, honouring its ignore list
    /// for stack outputs added later.
    pub fn from_config(config: &DeployConfig) -> Self {
        let mut table = Self {
            entries: Map::new(),
            ignore: config.ignore.clone(),
        };
        for (key, value) in &config.static_pairs {
            table.insert(STATIC_SOURCE, key, value.clone());
        }
        table
    }

    pub fn with_ignore(mut self, keys: Vec<String>) -> Self {
        self.ignore = keys;
        self
    }

    pub fn insert(&mut self, source: &str, key: &str, value: Value) {
        info!("[{}]: adding key -> {}", source, key);
        self.entries.insert(format!("{}_{}", source, key), value);
    }

    /// Add the outputs of one stack, skipping ignored keys.
    pub fn insert_stack_outputs<I, K, V>(&mut self, stack_name: &str, outputs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in outputs {
            let key = key.as_ref();
            if self.ignore.iter().any(|k| k == key) {
                info!("[{}]: ignoring key -> {}", stack_name, key);
                continue;
            }
            self.insert(stack_name, key, Value::String(value.into()));
        }
    }

    pub fn get(&self, key: &str) -> ConfigResult<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// `NAME=value` lines, one per entry, sorted. Names are upper-cased with
    /// dashes turned into underscores; strings are quoted.
    pub fn render_constants(&self) -> String {
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}={}", constant_name(key), constant_value(value)))
            .collect();
        lines.sort();

        let mut rendered = lines.join("\n");
        rendered.push('\n');
        rendered
    }

    /// Write the constants to `path` under a generation timestamp header.
    pub fn write_constants(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        debug!("Writing {} constants to {:?}", self.len(), path);

        let content = format!(
            "# Config Generated @ {}\n\n{}",
            Utc::now().to_rfc3339(),
            self.render_constants()
        );
        fs::write(path, content)?;
        Ok(())
    }
}

fn constant_name(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}

/// Strings are written as JSON string literals so quotes and backslashes
/// are escaped.
fn constant_value(value: &Value) -> String {
    value.to_string()
}

/// Merge `outputs` into the JSON object stored at `path`, creating the file
/// when it does not exist. Returns the merged object.
pub fn merge_outputs_into_file<I, K, V>(path: impl AsRef<Path>, outputs: I) -> ConfigResult<Map<String, Value>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let path = path.as_ref();

    let mut merged = if path.is_file() {
        let content = fs::read_to_string(path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(existing) => existing,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: path.display().to_string(),
                    message: "expected a JSON object".to_string(),
                })
            }
        }
    } else {
        Map::new()
    };

    for (key, value) in outputs {
        merged.insert(key.into(), Value::String(value.into()));
    }

    let mut content = serde_json::to_string_pretty(&merged)?;
    content.push('\n');
    fs::write(path, content)?;
    info!("Merged outputs into {:?}", path);

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_and_stack_entries() {
        let mut table = OutputTable::new().with_ignore(vec!["BuildUserAccessSecret".to_string()]);
        table.insert(STATIC_SOURCE, "bucket", json!("dev-artifacts"));
        table.insert_stack_outputs(
            "config-build-system",
            [
                ("BuildSystemRoleName", "devCFconfigBuildRole"),
                ("BuildUserAccessSecret", "shh"),
            ],
        );

        assert_eq!(table.get("static_bucket").unwrap(), &json!("dev-artifacts"));
        assert_eq!(
            table.get("config-build-system_BuildSystemRoleName").unwrap(),
            &json!("devCFconfigBuildRole")
        );
        assert!(matches!(
            table.get("config-build-system_BuildUserAccessSecret"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_render_constants_sorted() {
        let mut table = OutputTable::new();
        table.insert("config-build-system", "RoleName", json!("devRole"));
        table.insert(STATIC_SOURCE, "retries", json!(3));
        table.insert(STATIC_SOURCE, "enabled", json!(true));

        assert_eq!(
            table.render_constants(),
            "CONFIG_BUILD_SYSTEM_ROLENAME=\"devRole\"\nSTATIC_ENABLED=true\nSTATIC_RETRIES=3\n"
        );
    }

    #[test]
    fn test_render_constants_escapes_strings() {
        let mut table = OutputTable::new();
        table.insert(STATIC_SOURCE, "motd", json!(r#"say "hi" from C:\build"#));

        assert_eq!(
            table.render_constants(),
            "STATIC_MOTD=\"say \\\"hi\\\" from C:\\\\build\"\n"
        );
    }
}
