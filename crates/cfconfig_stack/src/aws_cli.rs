//! `aws` CLI backed implementation of the remote API.
//!
//! Each call runs one `aws cloudformation …` or `aws sts …` command with
//! `--output json` and parses stdout. Assumed credentials are handed over
//! through the environment; the ambient session uses the configured
//! profile, if any.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info};

use crate::api::{RoleAssumer, StackApi, StackEvent, StackOutput, StackSummary, TemplateValidation};
use crate::credentials::{Credentials, Session};
use crate::error::{StackError, StackResult};
use crate::request::StackRequest;

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
pub const DEFAULT_RETRY_MODE: &str = "standard";

/// Options for [`AwsCli`].
#[derive(Debug, Clone)]
pub struct AwsCliOptions {
    /// Executable to run.
    pub executable: String,
    pub region: String,
    /// Profile for the ambient session and for role assumption.
    pub profile: Option<String>,
    pub max_attempts: u32,
    pub retry_mode: String,
    /// Log mutating calls instead of running them.
    pub dry_run: bool,
}

impl Default for AwsCliOptions {
    fn default() -> Self {
        Self {
            executable: "aws".to_string(),
            region: DEFAULT_REGION.to_string(),
            profile: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_mode: DEFAULT_RETRY_MODE.to_string(),
            dry_run: false,
        }
    }
}

impl AwsCliOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksResponse {
    #[serde(default)]
    stacks: Vec<DescribedStack>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribedStack {
    #[serde(flatten)]
    summary: StackSummary,
    #[serde(default)]
    outputs: Vec<StackOutput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackEventsResponse {
    #[serde(default)]
    stack_events: Vec<StackEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackIdResponse {
    stack_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    credentials: Credentials,
}

/// Remote API adapter that shells out to the AWS CLI.
#[derive(Debug, Clone)]
pub struct AwsCli {
    options: AwsCliOptions,
}

impl AwsCli {
    pub fn new(options: AwsCliOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AwsCliOptions {
        &self.options
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Check that the executable runs at all.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.options.executable)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Arguments for one call, without the executable.
    fn build_args(&self, service: &str, operation: &str, args: &[String], session: &Session) -> Vec<String> {
        let mut full = vec![service.to_string(), operation.to_string()];
        full.extend(args.iter().cloned());
        full.push("--output".to_string());
        full.push("json".to_string());
        full.push("--region".to_string());
        full.push(self.options.region.clone());

        if let (Session::Ambient, Some(profile)) = (session, &self.options.profile) {
            full.push("--profile".to_string());
            full.push(profile.clone());
        }
        full
    }

    /// Format command for logging. Payload arguments are elided.
    fn format_command(&self, args: &[String]) -> String {
        let mut cmd = self.options.executable.clone();
        let mut hide_next = false;
        for arg in args {
            if hide_next {
                cmd.push_str(" '...'");
                hide_next = false;
                continue;
            }
            hide_next = arg == "--cli-input-json";
            cmd.push(' ');
            cmd.push_str(arg);
        }
        cmd
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        session: &Session,
        service: &str,
        operation: &str,
        args: &[String],
    ) -> StackResult<T> {
        let args = self.build_args(service, operation, args, session);
        debug!("Executing: {}", self.format_command(&args));

        let mut command = Command::new(&self.options.executable);
        command
            .args(&args)
            .env("AWS_MAX_ATTEMPTS", self.options.max_attempts.to_string())
            .env("AWS_RETRY_MODE", &self.options.retry_mode);

        if let Session::Assumed(creds) = session {
            command
                .env_remove("AWS_PROFILE")
                .env("AWS_ACCESS_KEY_ID", &creds.access_key_id)
                .env("AWS_SECRET_ACCESS_KEY", &creds.secret_access_key)
                .env("AWS_SESSION_TOKEN", &creds.session_token);
        }

        let output = command.output().await.map_err(|e| {
            StackError::CliNotAvailable(format!("{}: {}", self.options.executable, e))
        })?;

        if !output.status.success() {
            return Err(StackError::Api {
                operation: format!("{} {}", service, operation),
                message: failure_message(&output.stderr, output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let body = if stdout.trim().is_empty() { "{}" } else { stdout.trim() };
        serde_json::from_str(body).map_err(|e| StackError::InvalidResponse {
            operation: format!("{} {}", service, operation),
            message: e.to_string(),
        })
    }

    async fn describe_stacks(
        &self,
        session: &Session,
        stack_name: Option<&str>,
        limit: Option<usize>,
    ) -> StackResult<Vec<DescribedStack>> {
        let mut args = Vec::new();
        if let Some(name) = stack_name {
            args.push("--stack-name".to_string());
            args.push(name.to_string());
        }
        if let Some(limit) = limit {
            args.push("--max-items".to_string());
            args.push(limit.to_string());
        }
        let response: DescribeStacksResponse = self
            .invoke(session, "cloudformation", "describe-stacks", &args)
            .await?;
        Ok(response.stacks)
    }

    async fn submit(&self, session: &Session, operation: &str, request: &StackRequest) -> StackResult<String> {
        if self.options.dry_run {
            info!("[DRY-RUN] Would {} {}", operation, request.stack_name);
            debug!("[DRY-RUN] Payload: {}", request.to_input_json()?);
            return Ok(format!("dry-run/{}", request.stack_name));
        }

        info!("Submitting {} for {}", operation, request.stack_name);
        let args = vec!["--cli-input-json".to_string(), request.to_input_json()?];
        let response: StackIdResponse = self
            .invoke(session, "cloudformation", operation, &args)
            .await?;
        Ok(response.stack_id)
    }
}

#[async_trait]
impl StackApi for AwsCli {
    async fn list_stacks(
        &self,
        session: &Session,
        limit: Option<usize>,
    ) -> StackResult<Vec<StackSummary>> {
        let stacks = self.describe_stacks(session, None, limit).await?;
        Ok(stacks.into_iter().map(|s| s.summary).collect())
    }

    async fn create_stack(&self, session: &Session, request: &StackRequest) -> StackResult<String> {
        self.submit(session, "create-stack", request).await
    }

    async fn update_stack(&self, session: &Session, request: &StackRequest) -> StackResult<String> {
        self.submit(session, "update-stack", request).await
    }

    async fn describe_events(
        &self,
        session: &Session,
        stack_name: &str,
        limit: Option<usize>,
    ) -> StackResult<Vec<StackEvent>> {
        let mut args = vec!["--stack-name".to_string(), stack_name.to_string()];
        if let Some(limit) = limit {
            args.push("--max-items".to_string());
            args.push(limit.to_string());
        }
        let response: StackEventsResponse = self
            .invoke(session, "cloudformation", "describe-stack-events", &args)
            .await?;
        Ok(response.stack_events)
    }

    async fn describe_outputs(
        &self,
        session: &Session,
        stack_name: &str,
    ) -> StackResult<Vec<StackOutput>> {
        let stacks = self.describe_stacks(session, Some(stack_name), None).await?;
        Ok(stacks.into_iter().flat_map(|s| s.outputs).collect())
    }

    async fn validate_template(
        &self,
        session: &Session,
        template_body: &str,
    ) -> StackResult<TemplateValidation> {
        let input = json!({ "TemplateBody": template_body }).to_string();
        let args = vec!["--cli-input-json".to_string(), input];
        self.invoke(session, "cloudformation", "validate-template", &args)
            .await
    }
}

#[async_trait]
impl RoleAssumer for AwsCli {
    async fn assume_role(&self, role_arn: &str, session_name: &str) -> StackResult<Credentials> {
        let args = vec![
            "--role-arn".to_string(),
            role_arn.to_string(),
            "--role-session-name".to_string(),
            session_name.to_string(),
        ];
        let response: AssumeRoleResponse = self
            .invoke(&Session::Ambient, "sts", "assume-role", &args)
            .await
            .map_err(|e| match e {
                StackError::Api { message, .. } => StackError::AssumeRole {
                    role: role_arn.to_string(),
                    message,
                },
                other => other,
            })?;
        Ok(response.credentials)
    }
}

/// stderr of a failed command, or its exit status when stderr is blank.
fn failure_message(stderr: &[u8], status: std::process::ExitStatus) -> String {
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    if stderr.is_empty() {
        format!("aws exited with {}", status)
    } else {
        stderr
    }
}
