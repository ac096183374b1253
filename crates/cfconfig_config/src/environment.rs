//! Environment-keyed configuration lookup.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};

/// Deployment environment. `All` holds the fallback values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    All,
    Dev,
    Test,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::All => "all",
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }

    pub fn all() -> [Environment; 4] {
        [
            Environment::All,
            Environment::Dev,
            Environment::Test,
            Environment::Prod,
        ]
    }

    /// File holding this environment's values in a config directory.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Environment::All),
            "dev" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "prod" => Ok(Environment::Prod),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Per-environment key/value table with fallback to `all`.
///
/// Tables can be chained: a key missing here is looked up in the chained
/// tables, in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentTable {
    name: String,
    environments: BTreeMap<Environment, Map<String, Value>>,
    chained: Vec<EnvironmentTable>,
}

impl EnvironmentTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environments: Environment::all()
                .into_iter()
                .map(|env| (env, Map::new()))
                .collect(),
            chained: Vec::new(),
        }
    }

    /// Table seeded from the `<env>.json` files of a directory.
    pub fn from_directory(name: impl Into<String>, directory: impl AsRef<Path>) -> ConfigResult<Self> {
        let mut table = Self::new(name);
        table.update_from_directory(directory)?;
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain(mut self, other: EnvironmentTable) -> Self {
        self.chained.push(other);
        self.chained.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    /// Look up `key` for `environment`, falling back to `all`, then to the
    /// chained tables. Unknown environment names only see `all`.
    pub fn lookup(&self, environment: &str, key: &str) -> Option<&Value> {
        let specific = environment
            .parse::<Environment>()
            .ok()
            .and_then(|env| self.environments.get(&env))
            .and_then(|values| values.get(key));

        specific
            .or_else(|| {
                self.environments
                    .get(&Environment::All)
                    .and_then(|values| values.get(key))
            })
            .or_else(|| {
                self.chained
                    .iter()
                    .find_map(|table| table.lookup(environment, key))
            })
    }

    /// Look up an `env:key` compound key.
    pub fn get(&self, compound_key: &str) -> Option<&Value> {
        let (environment, key) = compound_key.split_once(':')?;
        self.lookup(environment, key)
    }

    pub fn set(&mut self, environment: &str, key: impl Into<String>, value: Value) -> ConfigResult<()> {
        let env = environment.parse::<Environment>()?;
        self.values_mut(env).insert(key.into(), value);
        Ok(())
    }

    /// Merge `values` into one environment; later values win.
    pub fn update(&mut self, environment: Environment, values: Map<String, Value>) {
        self.values_mut(environment).extend(values);
    }

    /// Merge every `<env>.json` present in `directory`. Missing files are
    /// skipped, as are files that do not hold a non-empty object.
    pub fn update_from_directory(&mut self, directory: impl AsRef<Path>) -> ConfigResult<()> {
        let directory = directory.as_ref();
        for env in Environment::all() {
            let path = directory.join(env.file_name());
            if !path.is_file() {
                continue;
            }

            debug!("Reading {} values from {:?}", env, path);
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<Value>(&content)? {
                Value::Object(values) if !values.is_empty() => self.update(env, values),
                _ => warn!("Skipping {:?}: not a non-empty JSON object", path),
            }
        }
        Ok(())
    }

    fn values_mut(&mut self, env: Environment) -> &mut Map<String, Value> {
        self.environments.entry(env).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> EnvironmentTable {
        let mut table = EnvironmentTable::new("test");
        table.set("dev", "dev", json!("dev")).unwrap();
        table.set("all", "fallback", json!("all")).unwrap();
        table
    }

    #[test]
    fn test_simple_found() {
        assert_eq!(table().get("dev:dev"), Some(&json!("dev")));
    }

    #[test]
    fn test_simple_fallback() {
        assert_eq!(table().get("dev:fallback"), Some(&json!("all")));
        assert_eq!(table().get("staging:fallback"), Some(&json!("all")));
    }

    #[test]
    fn test_simple_not_found() {
        assert_eq!(table().get("test:test"), None);
        assert_eq!(table().get("no-separator"), None);
    }

    #[test]
    fn test_set_unknown_environment() {
        let mut table = table();
        assert!(matches!(
            table.set("staging", "key", json!(1)),
            Err(ConfigError::UnknownEnvironment(env)) if env == "staging"
        ));
    }

    #[test]
    fn test_chained_lookup() {
        let mut shared = EnvironmentTable::new("shared");
        shared.set("prod", "region", json!("us-east-1")).unwrap();

        let table = table().chain(shared);
        assert_eq!(table.lookup("prod", "region"), Some(&json!("us-east-1")));
        assert_eq!(table.lookup("dev", "region"), None);
    }
}
