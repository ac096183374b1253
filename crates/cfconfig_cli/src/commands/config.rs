//! Config command - Generate constants from static config and stack outputs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cfconfig_config::{DeployConfig, OutputTable};
use cfconfig_iam::TemplateRegistry;
use cfconfig_stack::{DeployContext, RoleAssumer, StackApi};

use super::{open_deployment, AwsArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    aws: AwsArgs,

    /// cloud-config.json file or the directory holding it
    #[arg(short, long, default_value = ".")]
    config: PathBuf,

    /// Write the constants to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: ConfigArgs) -> Result<()> {
    let config = DeployConfig::load(&args.config)
        .with_context(|| format!("Failed to load deploy config from {:?}", args.config))?;
    let environment = args
        .aws
        .environment
        .clone()
        .unwrap_or_else(|| config.environment.clone());
    let context = args.aws.context(&environment)?;
    let adapter = args.aws.adapter();

    let table = collect_outputs(&config, &context, &args.aws.region, adapter.clone(), adapter).await?;

    match &args.output {
        Some(path) => {
            table.write_constants(path)?;
            info!("Wrote {} constants to {}", table.len(), path.display());
        }
        None => print!("{}", table.render_constants()),
    }

    Ok(())
}

/// Static pairs of `config` plus the outputs of each of its stacks.
pub async fn collect_outputs(
    config: &DeployConfig,
    context: &DeployContext,
    region: &str,
    api: Arc<dyn StackApi>,
    assumer: Arc<dyn RoleAssumer>,
) -> Result<OutputTable> {
    let registry = TemplateRegistry::new();
    let mut table = OutputTable::from_config(config);

    for stack in &config.stacks {
        let mut deployment =
            open_deployment(&registry, stack, context, region, api.clone(), assumer.clone())?;
        let outputs = deployment
            .output()
            .await
            .with_context(|| format!("Failed to read outputs of stack {}", stack))?;
        table.insert_stack_outputs(stack, outputs);
    }

    Ok(table)
}
