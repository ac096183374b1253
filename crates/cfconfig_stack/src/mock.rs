//! In-memory remote API for testing.
//!
//! Provides a configurable [`StackApi`] and [`RoleAssumer`] that never
//! leave the process, so the orchestrator can be exercised without an
//! account.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::api::{RoleAssumer, StackApi, StackEvent, StackOutput, StackSummary, TemplateValidation};
use crate::credentials::{Credentials, Session};
use crate::error::{StackError, StackResult};
use crate::request::StackRequest;

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub stack_name: Option<String>,
    pub request: Option<StackRequest>,
    pub session: Session,
}

/// Mock remote API.
///
/// Events are scripted as a sequence of snapshots per stack: each
/// `describe_events` call returns the next snapshot, and the last one
/// repeats forever. Snapshots are expected newest first, like the API.
#[derive(Clone)]
pub struct MockStackApi {
    /// Stacks that "exist".
    stacks: Arc<RwLock<Vec<StackSummary>>>,
    /// Scripted event snapshots per stack.
    events: Arc<RwLock<HashMap<String, Vec<Vec<StackEvent>>>>>,
    /// Index of the next snapshot per stack.
    event_index: Arc<RwLock<HashMap<String, usize>>>,
    outputs: Arc<RwLock<HashMap<String, Vec<StackOutput>>>>,
    validation: Arc<RwLock<TemplateValidation>>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated failure, surfaced as an API error.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockStackApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStackApi {
    pub fn new() -> Self {
        Self {
            stacks: Arc::new(RwLock::new(Vec::new())),
            events: Arc::new(RwLock::new(HashMap::new())),
            event_index: Arc::new(RwLock::new(HashMap::new())),
            outputs: Arc::new(RwLock::new(HashMap::new())),
            validation: Arc::new(RwLock::new(TemplateValidation::default())),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a stack that "exists" with the given status.
    pub fn add_stack(self, name: impl Into<String>, status: impl Into<String>) -> Self {
        self.stacks.write().push(StackSummary::new(name, status));
        self
    }

    /// Fixed event history for a stack.
    pub fn with_events(self, stack_name: impl Into<String>, events: Vec<StackEvent>) -> Self {
        self.with_event_sequence(stack_name, vec![events])
    }

    /// Event snapshots returned by successive `describe_events` calls.
    pub fn with_event_sequence(
        self,
        stack_name: impl Into<String>,
        snapshots: Vec<Vec<StackEvent>>,
    ) -> Self {
        let stack_name = stack_name.into();
        self.event_index.write().remove(&stack_name);
        self.events.write().insert(stack_name, snapshots);
        self
    }

    pub fn with_outputs(self, stack_name: impl Into<String>, outputs: Vec<StackOutput>) -> Self {
        self.outputs.write().insert(stack_name.into(), outputs);
        self
    }

    pub fn with_validation(self, validation: TemplateValidation) -> Self {
        *self.validation.write() = validation;
        self
    }

    /// Set a failure to simulate.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls.read().iter().any(|c| c.method == method)
    }

    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Current status of a stack, if it exists.
    pub fn stack_status(&self, stack_name: &str) -> Option<String> {
        self.stacks
            .read()
            .iter()
            .find(|s| s.stack_name == stack_name)
            .map(|s| s.stack_status.clone())
    }

    fn record_call(
        &self,
        method: &str,
        session: &Session,
        stack_name: Option<&str>,
        request: Option<&StackRequest>,
    ) {
        self.captured_calls.write().push(CapturedCall {
            method: method.to_string(),
            stack_name: stack_name.map(str::to_string),
            request: request.cloned(),
            session: session.clone(),
        });
    }

    fn check_failure(&self, operation: &str) -> StackResult<()> {
        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(StackError::Api {
                operation: operation.to_string(),
                message,
            });
        }
        Ok(())
    }

    fn next_snapshot(&self, stack_name: &str) -> Vec<StackEvent> {
        let events = self.events.read();
        let Some(snapshots) = events.get(stack_name).filter(|s| !s.is_empty()) else {
            return Vec::new();
        };
        let mut index = self.event_index.write();
        let current = index.entry(stack_name.to_string()).or_insert(0);
        let snapshot = snapshots[(*current).min(snapshots.len() - 1)].clone();
        *current += 1;
        snapshot
    }

    fn set_status(&self, stack_name: &str, status: &str) {
        let mut stacks = self.stacks.write();
        match stacks.iter_mut().find(|s| s.stack_name == stack_name) {
            Some(stack) => stack.stack_status = status.to_string(),
            None => stacks.push(StackSummary::new(stack_name, status)),
        }
    }
}

#[async_trait]
impl StackApi for MockStackApi {
    async fn list_stacks(
        &self,
        session: &Session,
        limit: Option<usize>,
    ) -> StackResult<Vec<StackSummary>> {
        self.record_call("list_stacks", session, None, None);
        self.check_failure("list_stacks")?;
        let stacks = self.stacks.read();
        Ok(stacks
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn create_stack(&self, session: &Session, request: &StackRequest) -> StackResult<String> {
        self.record_call("create_stack", session, Some(&request.stack_name), Some(request));
        self.check_failure("create_stack")?;
        self.set_status(&request.stack_name, "CREATE_IN_PROGRESS");
        Ok(format!("mock-stack/{}/{}", request.stack_name, uuid::Uuid::new_v4()))
    }

    async fn update_stack(&self, session: &Session, request: &StackRequest) -> StackResult<String> {
        self.record_call("update_stack", session, Some(&request.stack_name), Some(request));
        self.check_failure("update_stack")?;
        if self.stack_status(&request.stack_name).is_none() {
            return Err(StackError::Api {
                operation: "update_stack".to_string(),
                message: format!("Stack [{}] does not exist", request.stack_name),
            });
        }
        self.set_status(&request.stack_name, "UPDATE_IN_PROGRESS");
        Ok(format!("mock-stack/{}", request.stack_name))
    }

    async fn describe_events(
        &self,
        session: &Session,
        stack_name: &str,
        limit: Option<usize>,
    ) -> StackResult<Vec<StackEvent>> {
        self.record_call("describe_events", session, Some(stack_name), None);
        self.check_failure("describe_events")?;
        let mut snapshot = self.next_snapshot(stack_name);
        if let Some(limit) = limit {
            snapshot.truncate(limit);
        }
        Ok(snapshot)
    }

    async fn describe_outputs(
        &self,
        session: &Session,
        stack_name: &str,
    ) -> StackResult<Vec<StackOutput>> {
        self.record_call("describe_outputs", session, Some(stack_name), None);
        self.check_failure("describe_outputs")?;
        Ok(self
            .outputs
            .read()
            .get(stack_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn validate_template(
        &self,
        session: &Session,
        _template_body: &str,
    ) -> StackResult<TemplateValidation> {
        self.record_call("validate_template", session, None, None);
        self.check_failure("validate_template")?;
        Ok(self.validation.read().clone())
    }
}

/// Role assumer that hands out fixed credentials and counts calls.
#[derive(Debug, Clone)]
pub struct StaticRoleAssumer {
    credentials: Credentials,
    calls: Arc<AtomicUsize>,
}

impl StaticRoleAssumer {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StaticRoleAssumer {
    fn default() -> Self {
        Self::new(Credentials::new("ASIAMOCK", "mock-secret", "mock-token"))
    }
}

#[async_trait]
impl RoleAssumer for StaticRoleAssumer {
    async fn assume_role(&self, _role_arn: &str, _session_name: &str) -> StackResult<Credentials> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.credentials.clone())
    }
}
