//! # cfconfig_template
//!
//! Intermediate representation and builder for CloudFormation IAM templates.
//!
//! Everything in this crate is pure: statements, policies, resources and
//! outputs are plain values, and a [`Template`] serializes to the same bytes
//! every time it is built from the same inputs.
//!
//! ## Features
//!
//! - Ordered `{Key, Value}` tag sets
//! - Allow statements with optional deny-everything-else pairing
//! - Environment-prefixed policies and resources
//! - Tag inheritance with a per-type exclusion set
//! - `Ref` / `Fn::GetAtt` outputs
//! - Construct-once [`StackTemplate`] wrapper with JSON and YAML views
//!
//! ## Example
//!
//! ```rust
//! use cfconfig_template::{OutputValue, ResourceType, StatementBuilder, TemplateBuilder};
//!
//! let builder = TemplateBuilder::new("dev").with_tag("System", "config-build");
//!
//! let policy = builder.build_policy(
//!     "CFRolePolicy",
//!     [StatementBuilder::allow("cloudformation:*").on("*").build().unwrap()],
//! );
//!
//! let role = builder
//!     .resource("BuildRole", ResourceType::Role)
//!     .policy(policy)
//!     .build()
//!     .unwrap();
//!
//! let template = builder
//!     .build_template(
//!         vec![role],
//!         vec![],
//!         vec![builder.build_output("RoleArn", OutputValue::from(builder.arn("BuildRole")))],
//!     )
//!     .unwrap();
//!
//! println!("{}", template.to_json().unwrap());
//! ```

pub mod builder;
pub mod error;
pub mod names;
pub mod output;
pub mod policy;
pub mod resource;
pub mod stack_template;
pub mod statement;
pub mod tags;
pub mod template;

pub use builder::{ResourceBuilder, TemplateBuilder};
pub use error::{TemplateError, TemplateResult};
pub use names::{Intrinsic, LogicalName};
pub use output::{Output, OutputValue, DEFAULT_ATTRIBUTE};
pub use policy::{Policy, PolicyDocument, POLICY_VERSION};
pub use resource::{Resource, ResourceType};
pub use stack_template::{StackTemplate, TemplateSource, TemplateState};
pub use statement::{build_statement, ActionList, Effect, ResourceList, Statement, StatementBuilder};
pub use tags::{Tag, TagSet};
pub use template::{Template, TEMPLATE_VERSION};
