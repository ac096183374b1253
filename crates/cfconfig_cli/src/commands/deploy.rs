//! Deploy command - Run a verb against the configured stacks.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::info;

use cfconfig_config::{merge_outputs_into_file, DeployConfig};
use cfconfig_iam::TemplateRegistry;
use cfconfig_stack::{BuildAction, EventAttribute, EventQuery, EventRecord, StackDeployment, WaitOptions};

use super::{open_deployment, AwsArgs, DeployFailed};

#[derive(Args)]
pub struct DeployArgs {
    #[command(flatten)]
    aws: AwsArgs,

    /// cloud-config.json file or the directory holding it
    #[arg(short, long, default_value = ".")]
    config: PathBuf,

    /// Only run on this stack
    #[arg(long)]
    stack: Option<String>,

    /// Verb to run (template-json, build, status, events, ...)
    verb: String,

    /// Target file for `write`
    path: Option<PathBuf>,

    /// Limit event output to N entries
    #[arg(long)]
    limit: Option<usize>,

    /// Seconds to wait for a build before giving up
    #[arg(long, default_value_t = 1800)]
    timeout: u64,

    /// Keep failed resources instead of rolling back
    #[arg(long)]
    no_rollback: bool,
}

/// A recognised deploy verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployVerb {
    TemplateJson,
    TemplatePython,
    Build,
    Status,
    OutputJson,
    OutputPython,
    Events,
    Validate,
    List,
    Reasons,
    Write(PathBuf),
}

impl DeployVerb {
    /// `None` for verbs that are not recognised.
    pub fn parse(verb: &str, path: Option<PathBuf>) -> Result<Option<Self>> {
        let parsed = match verb {
            "template-json" => DeployVerb::TemplateJson,
            "template-python" => DeployVerb::TemplatePython,
            "build" => DeployVerb::Build,
            "status" => DeployVerb::Status,
            "output-json" => DeployVerb::OutputJson,
            "output-python" => DeployVerb::OutputPython,
            "events" => DeployVerb::Events,
            "validate" => DeployVerb::Validate,
            "list" => DeployVerb::List,
            "reasons" => DeployVerb::Reasons,
            "write" => match path {
                Some(path) => DeployVerb::Write(path),
                None => anyhow::bail!("argument <PATH> is required for write"),
            },
            _ => return Ok(None),
        };
        Ok(Some(parsed))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployVerb::TemplateJson => "template-json",
            DeployVerb::TemplatePython => "template-python",
            DeployVerb::Build => "build",
            DeployVerb::Status => "status",
            DeployVerb::OutputJson => "output-json",
            DeployVerb::OutputPython => "output-python",
            DeployVerb::Events => "events",
            DeployVerb::Validate => "validate",
            DeployVerb::List => "list",
            DeployVerb::Reasons => "reasons",
            DeployVerb::Write(_) => "write",
        }
    }
}

impl std::fmt::Display for DeployVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings that apply to every stack of one invocation.
#[derive(Debug, Clone)]
pub struct VerbOptions {
    pub limit: Option<usize>,
    pub rollback: bool,
    /// Submissions are only logged, so `build` has nothing to wait for.
    pub dry_run: bool,
    pub wait: WaitOptions,
}

impl Default for VerbOptions {
    fn default() -> Self {
        Self {
            limit: None,
            rollback: true,
            dry_run: false,
            wait: WaitOptions::default(),
        }
    }
}

pub async fn execute(args: DeployArgs, quiet: bool) -> Result<()> {
    let Some(verb) = DeployVerb::parse(&args.verb, args.path.clone())? else {
        println!("unknown command: {}", args.verb);
        return Ok(());
    };

    let config = DeployConfig::load(&args.config)
        .with_context(|| format!("Failed to load deploy config from {:?}", args.config))?;
    let environment = args
        .aws
        .environment
        .clone()
        .unwrap_or_else(|| config.environment.clone());
    let context = args.aws.context(&environment)?;
    let adapter = args.aws.adapter();
    let registry = TemplateRegistry::new();

    let stacks = select_stacks(&config, args.stack.as_deref())?;
    info!("executing on stacks: {}", stacks.join(","));

    let mut wait = WaitOptions::new().timeout(Duration::from_secs(args.timeout));
    if !quiet {
        wait = wait.with_progress();
    }
    let options = VerbOptions {
        limit: args.limit,
        rollback: !args.no_rollback,
        dry_run: args.aws.dry_run,
        wait,
    };

    let mut stdout = std::io::stdout();
    for stack in stacks {
        info!("deploying stack -> {}", stack);
        let mut deployment = open_deployment(
            &registry,
            &stack,
            &context,
            &args.aws.region,
            adapter.clone(),
            adapter.clone(),
        )?;

        run_verb(&mut deployment, &verb, &options, &mut stdout)
            .await
            .with_context(|| format!("{} failed for stack {}", verb, stack))?;
    }

    Ok(())
}

/// Stacks to operate on: all configured stacks, or the one asked for.
pub fn select_stacks(config: &DeployConfig, only: Option<&str>) -> Result<Vec<String>> {
    match only {
        None => Ok(config.stacks.clone()),
        Some(name) if config.stacks.iter().any(|s| s == name) => Ok(vec![name.to_string()]),
        Some(name) => anyhow::bail!("argument --stack: {} is not listed in cloud-config stacks", name),
    }
}

/// Run one verb on one stack, writing its report to `out`.
pub async fn run_verb<W: Write>(
    deployment: &mut StackDeployment,
    verb: &DeployVerb,
    options: &VerbOptions,
    out: &mut W,
) -> Result<()> {
    match verb {
        DeployVerb::TemplateJson => write!(out, "{}", deployment.template_json()?)?,
        DeployVerb::TemplatePython => write!(out, "{}", deployment.template_yaml()?)?,
        DeployVerb::Build => build(deployment, options, out).await?,
        DeployVerb::Status => {
            let status = deployment.status().await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
        }
        DeployVerb::OutputJson => {
            let outputs = deployment.output().await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&outputs)?)?;
        }
        DeployVerb::OutputPython => {
            let outputs = deployment.output().await?;
            write!(out, "{}", serde_yaml::to_string(&outputs)?)?;
        }
        DeployVerb::Events => {
            let mut query = EventQuery::standard();
            if let Some(limit) = options.limit {
                query = query.with_limit(limit);
            }
            let events = deployment.events(&query).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&events)?)?;
        }
        DeployVerb::Validate => {
            let validation = deployment.validate().await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&validation)?)?;
        }
        DeployVerb::List => {
            for stack in deployment.list().await? {
                writeln!(out, "{}\t{}", stack.stack_name, stack.stack_status)?;
            }
        }
        DeployVerb::Reasons => {
            for record in deployment.failure().await? {
                writeln!(out, "{}", describe_failure(&record))?;
            }
        }
        DeployVerb::Write(path) => {
            let outputs = deployment.output().await?;
            let count = outputs.len();
            merge_outputs_into_file(path, outputs)?;
            writeln!(out, "wrote {} output(s) to {}", count, path.display())?;
        }
    }
    Ok(())
}

async fn build<W: Write>(
    deployment: &mut StackDeployment,
    options: &VerbOptions,
    out: &mut W,
) -> Result<()> {
    let action = deployment.build(options.rollback).await?;
    if options.dry_run {
        let planned = match action {
            BuildAction::Created { .. } => "create",
            BuildAction::Updated { .. } => "update",
        };
        writeln!(out, "dry run: would {} {}", planned, deployment.stack_name())?;
        return Ok(());
    }

    match action {
        BuildAction::Created { stack_id } => writeln!(out, "creating {}", stack_id)?,
        BuildAction::Updated { stack_id } => writeln!(out, "updating {}", stack_id)?,
    }

    let outcome = deployment.wait(&options.wait).await?;
    writeln!(out, "{}: {}", deployment.stack_name(), outcome.status)?;

    if !outcome.succeeded() {
        if let Some(reason) = &outcome.reason {
            writeln!(out, "{}", reason)?;
        }
        return Err(DeployFailed {
            stack: deployment.stack_name().to_string(),
            status: outcome.status,
            reason: outcome.reason,
        }
        .into());
    }
    Ok(())
}

fn describe_failure(record: &EventRecord) -> String {
    let field = |attribute| {
        record
            .get(attribute)
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string()
    };
    format!(
        "{} {}: {}",
        field(EventAttribute::LogicalResourceId),
        field(EventAttribute::ResourceStatus),
        field(EventAttribute::ResourceStatusReason)
    )
}
