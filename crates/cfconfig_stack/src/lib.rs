//! # cfconfig_stack
//!
//! Deployment lifecycle for a single CloudFormation stack.
//!
//! ## Features
//!
//! - Create-or-update decision from the stack's current state
//! - Role assumption with cached, expiry-aware temporary credentials
//! - Event projection and the complete/failed/rollback status taxonomy
//! - Poll-until-terminal wait loop with a timeout
//! - `aws` CLI backed remote API plus an in-memory mock for tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cfconfig_stack::{
//!     AwsCli, AwsCliOptions, CredentialProvider, DeployContext, StackDeployment, WaitOptions,
//! };
//!
//! # async fn example() -> cfconfig_stack::StackResult<()> {
//! let cli = Arc::new(AwsCli::new(AwsCliOptions::new().profile("deploy")));
//! let context = DeployContext::new("arn:aws:iam::123456789012:role/build", "deploy", "dev");
//! let provider = CredentialProvider::new(&context, cli.clone());
//!
//! let mut deployment = StackDeployment::new("devBuildSystem", cli, provider);
//! println!("{:?}", deployment.status().await?);
//! deployment.wait(&WaitOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod aws_cli;
pub mod credentials;
pub mod deploy;
pub mod error;
pub mod events;
pub mod mock;
pub mod request;
pub mod status;

pub use api::{
    RoleAssumer, StackApi, StackEvent, StackOutput, StackSummary, TemplateParameter,
    TemplateValidation,
};
pub use aws_cli::{AwsCli, AwsCliOptions, DEFAULT_REGION};
pub use credentials::{
    CredentialProvider, CredentialState, Credentials, DeployContext, Session, ROOT_PROFILE,
    SESSION_NAME,
};
pub use deploy::{BuildAction, StackDeployment, StackQuery, WaitOptions, WaitOutcome};
pub use error::{StackError, StackResult};
pub use events::{EventAttribute, EventQuery, EventRecord};
pub use mock::{CapturedCall, MockStackApi, StaticRoleAssumer};
pub use request::{StackOverrides, StackRequest, DEFAULT_CAPABILITIES};
pub use status::{is_terminal, terminal_statuses, StatusClass};
