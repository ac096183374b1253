//! cfdeploy - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Configuration error
//! - 4: Template error
//! - 5: Stack API error
//! - 6: Stack did not reach a complete state

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cfconfig_config::ConfigError;
use cfconfig_iam::IamError;
use cfconfig_stack::StackError;
use cfconfig_template::TemplateError;

mod commands;

use commands::{Cli, Commands, DeployFailed};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIG_ERROR: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const STACK_ERROR: u8 = 5;
    pub const DEPLOY_FAILED: u8 = 6;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "cfconfig=debug,cfdeploy=debug,warn"
    } else if cli.quiet {
        "warn"
    } else {
        "cfconfig=info,cfdeploy=info,warn"
    };

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Deploy(args) => commands::deploy::execute(args, cli.quiet).await,
        Commands::Config(args) => commands::config::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map the first recognised error in the chain to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<DeployFailed>().is_some() {
            return ExitCodes::DEPLOY_FAILED;
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return ExitCodes::CONFIG_ERROR;
        }
        if cause.downcast_ref::<TemplateError>().is_some() {
            return ExitCodes::TEMPLATE_ERROR;
        }
        if let Some(err) = cause.downcast_ref::<IamError>() {
            return match err {
                IamError::UnknownStack(_) => ExitCodes::INVALID_ARGS,
                IamError::Template(_) => ExitCodes::TEMPLATE_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<StackError>() {
            return match err {
                StackError::Template(_) | StackError::MissingTemplate(_) => ExitCodes::TEMPLATE_ERROR,
                StackError::WaitTimeout { .. } => ExitCodes::DEPLOY_FAILED,
                _ => ExitCodes::STACK_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
