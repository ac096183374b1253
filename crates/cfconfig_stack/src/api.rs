//! Remote API boundary.
//!
//! [`StackApi`] covers the CloudFormation calls the orchestrator needs and
//! [`RoleAssumer`] the single STS call behind the credential provider. The
//! wire types deserialize straight from the API's PascalCase JSON.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credentials::{Credentials, Session};
use crate::error::StackResult;
use crate::request::StackRequest;

/// One stack as reported by `DescribeStacks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackSummary {
    pub stack_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    pub stack_status: String,
}

impl StackSummary {
    pub fn new(stack_name: impl Into<String>, stack_status: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            stack_id: None,
            stack_status: stack_status.into(),
        }
    }
}

/// A stack or resource lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackEvent {
    pub stack_id: String,
    #[serde(default)]
    pub stack_name: Option<String>,
    #[serde(default)]
    pub logical_resource_id: Option<String>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_status: Option<String>,
    #[serde(default)]
    pub resource_status_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StackEvent {
    /// Event about the stack itself rather than one of its resources.
    pub fn for_stack(
        stack_name: impl Into<String>,
        status: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let stack_name = stack_name.into();
        Self {
            stack_id: format!("arn:aws:cloudformation:stack/{}", stack_name),
            stack_name: Some(stack_name.clone()),
            logical_resource_id: Some(stack_name.clone()),
            physical_resource_id: None,
            resource_type: Some("AWS::CloudFormation::Stack".to_string()),
            resource_status: Some(status.into()),
            resource_status_reason: None,
            timestamp,
        }
    }

    /// Event about one resource of a stack.
    pub fn for_resource(
        stack_name: impl Into<String>,
        logical_resource_id: impl Into<String>,
        resource_type: impl Into<String>,
        status: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut event = Self::for_stack(stack_name, status, timestamp);
        event.logical_resource_id = Some(logical_resource_id.into());
        event.resource_type = Some(resource_type.into());
        event
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.resource_status_reason = Some(reason.into());
        self
    }

    pub fn status(&self) -> Option<&str> {
        self.resource_status.as_deref()
    }

    /// Whether the event concerns the named stack rather than a resource in it.
    pub fn is_stack_event(&self, stack_name: &str) -> bool {
        self.logical_resource_id.as_deref() == Some(stack_name)
    }
}

/// An exported stack output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutput {
    pub output_key: String,
    pub output_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            output_key: key.into(),
            output_value: value.into(),
            export_name: None,
            description: None,
        }
    }
}

/// Parameter declared by a validated template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateParameter {
    pub parameter_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub no_echo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of remote template validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities_reason: Option<String>,
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
}

/// CloudFormation operations used by the orchestrator.
///
/// Every call takes the session it should run under; implementations never
/// resolve credentials themselves.
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Stacks visible to the session, most recent first.
    async fn list_stacks(
        &self,
        session: &Session,
        limit: Option<usize>,
    ) -> StackResult<Vec<StackSummary>>;

    /// Create a stack, returning its id.
    async fn create_stack(&self, session: &Session, request: &StackRequest) -> StackResult<String>;

    /// Update a stack, returning its id.
    async fn update_stack(&self, session: &Session, request: &StackRequest) -> StackResult<String>;

    /// Events of a stack, most recent first.
    async fn describe_events(
        &self,
        session: &Session,
        stack_name: &str,
        limit: Option<usize>,
    ) -> StackResult<Vec<StackEvent>>;

    async fn describe_outputs(
        &self,
        session: &Session,
        stack_name: &str,
    ) -> StackResult<Vec<StackOutput>>;

    async fn validate_template(
        &self,
        session: &Session,
        template_body: &str,
    ) -> StackResult<TemplateValidation>;
}

/// Exchanges the ambient identity for temporary role credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(&self, role_arn: &str, session_name: &str) -> StackResult<Credentials>;
}
