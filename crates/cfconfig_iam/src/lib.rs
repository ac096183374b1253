//! # cfconfig_iam
//!
//! IAM template factories for cfconfig stacks.
//!
//! ## Features
//!
//! - Build-system template: CloudFormation role, group restricted to that
//!   role, deploy user and access key, with name/ARN/credential outputs
//! - Registry mapping stack names to template factories and stack tags
//!
//! ## Example
//!
//! ```rust
//! use cfconfig_iam::{TemplateRegistry, STACK_NAME};
//!
//! let registry = TemplateRegistry::new();
//! let mut template = registry.template_for(STACK_NAME, "dev").unwrap();
//! println!("{}", template.to_json().unwrap());
//! ```

pub mod build_system;
pub mod error;
pub mod registry;

pub use build_system::{build_system_tags, BuildSystemTemplate, STACK_NAME};
pub use error::{IamError, IamResult};
pub use registry::{RegisteredTemplate, TemplateRegistry};
