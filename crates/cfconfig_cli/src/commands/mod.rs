//! CLI command definitions.
//!
//! `deploy` runs one verb against every stack of a cloud-config file;
//! `config` turns static config and stack outputs into constants.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use cfconfig_iam::TemplateRegistry;
use cfconfig_stack::{
    AwsCli, AwsCliOptions, CredentialProvider, DeployContext, RoleAssumer, StackApi,
    StackDeployment, DEFAULT_REGION,
};

pub mod config;
pub mod deploy;

/// Profile used when none is given.
pub const BUILD_PROFILE: &str = "build-system";

/// cfdeploy - CloudFormation IAM stacks built from code
#[derive(Parser)]
#[command(name = "cfdeploy")]
#[command(version, about = "Build, deploy and inspect cfconfig CloudFormation stacks")]
#[command(long_about = r#"
cfdeploy synthesizes IAM CloudFormation templates and drives their stacks
through create, update and status inspection using a restricted build role.

COMMANDS:
  deploy <verb>   → Run a deploy verb on every stack in cloud-config.json
  config          → Generate constants from static config and stack outputs

DEPLOY VERBS:
  template-json     print the template as JSON
  template-python   print the template as a readable dump
  build             create or update the stack, then wait for it
  status            print the latest stack event
  output-json       print the stack outputs as JSON
  output-python     print the stack outputs as a readable dump
  events            print the event history (--limit N)
  validate          validate the template remotely
  list              list visible stacks
  reasons           print failure reasons
  write <path>      merge the stack outputs into a JSON file

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration error
  4 - Template error
  5 - Stack API error
  6 - Stack did not reach a complete state
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a deploy verb on the configured stacks
    Deploy(deploy::DeployArgs),

    /// Generate configuration constants from stack outputs
    Config(config::ConfigArgs),
}

/// Identity and region options shared by all commands.
#[derive(Args, Debug, Clone)]
pub struct AwsArgs {
    /// Role ARN assumed for stack operations
    #[arg(long, env = "CFCONFIG_ROLE", default_value = "")]
    pub role: String,

    /// Credentials profile; "root" skips role assumption
    #[arg(long, env = "CFCONFIG_PROFILE", default_value = BUILD_PROFILE)]
    pub profile: String,

    /// Target environment (defaults to the cloud-config `env`)
    #[arg(short, long, env = "CFCONFIG_ENVIRONMENT")]
    pub environment: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Log mutating calls instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

impl AwsArgs {
    pub fn context(&self, environment: &str) -> anyhow::Result<DeployContext> {
        let context = DeployContext::new(&self.role, &self.profile, environment);
        if !context.is_root() && context.role.is_empty() {
            anyhow::bail!("argument --role is required unless --profile is root");
        }
        Ok(context)
    }

    pub fn adapter(&self) -> Arc<AwsCli> {
        let mut options = AwsCliOptions::new()
            .region(&self.region)
            .profile(&self.profile);
        if self.dry_run {
            options = options.dry_run();
        }
        Arc::new(AwsCli::new(options))
    }
}

/// A `build` that ended in a failed or rolled-back state.
#[derive(Error, Debug)]
#[error("stack {stack} finished with {status}")]
pub struct DeployFailed {
    pub stack: String,
    pub status: String,
    pub reason: Option<String>,
}

/// Orchestrator for one stack, with its registered template attached when
/// there is one.
pub fn open_deployment(
    registry: &TemplateRegistry,
    stack_name: &str,
    context: &DeployContext,
    region: &str,
    api: Arc<dyn StackApi>,
    assumer: Arc<dyn RoleAssumer>,
) -> anyhow::Result<StackDeployment> {
    let provider = CredentialProvider::new(context, assumer);
    let mut deployment = StackDeployment::new(stack_name, api, provider);

    if let Some(entry) = registry.get(stack_name) {
        let mut tags = entry.tags().clone();
        tags.insert("region", region);
        tags.insert("environment", &context.environment);

        deployment = deployment
            .with_template(registry.template_for(stack_name, &context.environment)?)
            .with_tags(tags);
    }

    Ok(deployment)
}
