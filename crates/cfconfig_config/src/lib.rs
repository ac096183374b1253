//! # cfconfig_config
//!
//! Deployment configuration for cfconfig.
//!
//! ## Features
//!
//! - `cloud-config.json` loading (environment, stack list, ignore list, static pairs)
//! - Environment-keyed lookup table with `all` fallback
//! - Output table combining static pairs and stack outputs
//! - Sorted constants rendering and JSON output-file merging
//!
//! ## Example
//!
//! ```rust,no_run
//! use cfconfig_config::{DeployConfig, OutputTable};
//!
//! let config = DeployConfig::load("deploy/").unwrap();
//! let mut table = OutputTable::from_config(&config);
//! table.insert_stack_outputs("config-build-system", [("RoleName", "devCFconfigBuildRole")]);
//! print!("{}", table.render_constants());
//! ```

pub mod cloud_config;
pub mod environment;
pub mod error;
pub mod outputs;

pub use cloud_config::{DeployConfig, CLOUD_CONFIG_FILE, RESERVED_KEYS};
pub use environment::{Environment, EnvironmentTable};
pub use error::{ConfigError, ConfigResult};
pub use outputs::{merge_outputs_into_file, OutputTable, STATIC_SOURCE};
