//! Stack deployment orchestrator.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use cfconfig_template::{StackTemplate, TagSet};

use crate::api::{StackApi, StackEvent, StackSummary, TemplateValidation};
use crate::credentials::{CredentialProvider, Session};
use crate::error::{StackError, StackResult};
use crate::events::{EventQuery, EventRecord};
use crate::request::{StackOverrides, StackRequest};
use crate::status::{terminal_statuses, StatusClass};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Events fetched when looking for the latest stack-level event.
const STACK_EVENT_WINDOW: usize = 50;

/// Wait loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    /// Suppress progress lines. On by default.
    pub quiet: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_WAIT_TIMEOUT),
            quiet: true,
        }
    }
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Log a progress line with the latest status on every poll.
    pub fn with_progress(mut self) -> Self {
        self.quiet = false;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Which stacks `find` matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackQuery {
    /// Stack name; `None` means the orchestrator's own stack.
    pub name: Option<String>,
    /// Accepted statuses; `None` accepts any.
    pub statuses: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl Default for StackQuery {
    fn default() -> Self {
        Self {
            name: None,
            statuses: Some(terminal_statuses().into_iter().map(String::from).collect()),
            limit: None,
        }
    }
}

impl StackQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_statuses(mut self, statuses: &[&str]) -> Self {
        self.statuses = Some(statuses.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn any_status(mut self) -> Self {
        self.statuses = None;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, default_name: &str, stack: &StackSummary) -> bool {
        let name = self.name.as_deref().unwrap_or(default_name);
        stack.stack_name == name
            && self
                .statuses
                .as_ref()
                .map(|s| s.iter().any(|status| *status == stack.stack_status))
                .unwrap_or(true)
    }
}

/// What `build` decided to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BuildAction {
    Created { stack_id: String },
    Updated { stack_id: String },
}

impl BuildAction {
    pub fn stack_id(&self) -> &str {
        match self {
            BuildAction::Created { stack_id } | BuildAction::Updated { stack_id } => stack_id,
        }
    }
}

/// Final state observed by `wait`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOutcome {
    pub status: String,
    pub class: StatusClass,
    pub reason: Option<String>,
}

impl WaitOutcome {
    pub fn succeeded(&self) -> bool {
        self.class == StatusClass::Complete
    }
}

/// Reconciles one named stack against its template.
///
/// The template is optional: read-only operations (status, events,
/// outputs) work without one.
pub struct StackDeployment {
    stack_name: String,
    template: Option<StackTemplate>,
    tags: TagSet,
    api: Arc<dyn StackApi>,
    credentials: CredentialProvider,
}

impl StackDeployment {
    pub fn new(
        stack_name: impl Into<String>,
        api: Arc<dyn StackApi>,
        credentials: CredentialProvider,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            template: None,
            tags: TagSet::new(),
            api,
            credentials,
        }
    }

    pub fn with_template(mut self, template: StackTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Stack-level tags sent with create and update.
    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn credentials(&self) -> &CredentialProvider {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut CredentialProvider {
        &mut self.credentials
    }

    fn template_mut(&mut self) -> StackResult<&mut StackTemplate> {
        let name = self.stack_name.clone();
        self.template
            .as_mut()
            .ok_or(StackError::MissingTemplate(name))
    }

    pub fn template_json(&mut self) -> StackResult<String> {
        Ok(self.template_mut()?.to_json()?)
    }

    pub fn template_yaml(&mut self) -> StackResult<String> {
        Ok(self.template_mut()?.to_yaml()?)
    }

    async fn session(&mut self) -> StackResult<Session> {
        self.credentials.credentials().await
    }

    /// Stacks matching `query`, in the order the API lists them.
    pub async fn find(&mut self, query: &StackQuery) -> StackResult<Vec<StackSummary>> {
        let session = self.session().await?;
        let stacks = self.api.list_stacks(&session, None).await?;
        let mut found: Vec<StackSummary> = stacks
            .into_iter()
            .filter(|s| query.matches(&self.stack_name, s))
            .collect();
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        debug!("find({}) matched {} stack(s)", self.stack_name, found.len());
        Ok(found)
    }

    /// Every stack visible to the session.
    pub async fn list(&mut self) -> StackResult<Vec<StackSummary>> {
        let session = self.session().await?;
        self.api.list_stacks(&session, None).await
    }

    /// Update the stack when it exists in a terminal state, create it
    /// otherwise.
    pub async fn build(&mut self, rollback: bool) -> StackResult<BuildAction> {
        let overrides = StackOverrides::new().disable_rollback(!rollback);
        if self.find(&StackQuery::new()).await?.is_empty() {
            let stack_id = self.create(overrides).await?;
            Ok(BuildAction::Created { stack_id })
        } else {
            let stack_id = self.update(overrides).await?;
            Ok(BuildAction::Updated { stack_id })
        }
    }

    pub async fn create(&mut self, overrides: StackOverrides) -> StackResult<String> {
        let request = self.request(overrides)?;
        let session = self.session().await?;
        info!("Creating stack {}", request.stack_name);
        self.api.create_stack(&session, &request).await
    }

    pub async fn update(&mut self, overrides: StackOverrides) -> StackResult<String> {
        let request = self.request(overrides)?;
        let session = self.session().await?;
        info!("Updating stack {}", request.stack_name);
        self.api.update_stack(&session, &request).await
    }

    fn request(&mut self, overrides: StackOverrides) -> StackResult<StackRequest> {
        let body = match &overrides.template_body {
            Some(body) => body.clone(),
            None => self.template_json()?,
        };
        let mut request = StackRequest::new(self.stack_name.clone(), body);
        request.tags = self.tags.clone();
        Ok(overrides.apply(request))
    }

    /// Events filtered and projected per `query`.
    pub async fn events(&mut self, query: &EventQuery) -> StackResult<Vec<EventRecord>> {
        let session = self.session().await?;
        // a status filter may drop events, so only cap the fetch without one
        let fetch_limit = if query.statuses.is_none() { query.limit } else { None };
        let events = self
            .api
            .describe_events(&session, &self.stack_name, fetch_limit)
            .await?;
        Ok(query.apply(&events))
    }

    /// Most recent event.
    pub async fn status(&mut self) -> StackResult<Option<EventRecord>> {
        let mut records = self.events(&EventQuery::standard().with_limit(1)).await?;
        Ok(records.pop())
    }

    pub async fn failure(&mut self) -> StackResult<Vec<EventRecord>> {
        self.events(&EventQuery::standard().with_class(StatusClass::Failed))
            .await
    }

    pub async fn success(&mut self) -> StackResult<Vec<EventRecord>> {
        self.events(&EventQuery::standard().with_class(StatusClass::Complete))
            .await
    }

    pub async fn finished(&mut self) -> StackResult<Vec<EventRecord>> {
        self.events(&EventQuery::standard().terminal()).await
    }

    /// Latest event about the stack itself.
    async fn latest_stack_event(&mut self) -> StackResult<Option<StackEvent>> {
        let session = self.session().await?;
        let events = self
            .api
            .describe_events(&session, &self.stack_name, Some(STACK_EVENT_WINDOW))
            .await?;
        Ok(events
            .into_iter()
            .filter(|e| e.is_stack_event(&self.stack_name))
            .max_by_key(|e| e.timestamp))
    }

    /// True until the stack reaches a terminal status.
    pub async fn pending(&mut self) -> StackResult<bool> {
        let latest = self.latest_stack_event().await?;
        Ok(!latest
            .as_ref()
            .and_then(StackEvent::status)
            .map(|s| StatusClass::classify(s).is_terminal())
            .unwrap_or(false))
    }

    /// Poll until the stack reaches a terminal status.
    pub async fn wait(&mut self, options: &WaitOptions) -> StackResult<WaitOutcome> {
        let started = Instant::now();
        loop {
            let latest = self.latest_stack_event().await?;
            let status = latest.as_ref().and_then(StackEvent::status).map(str::to_string);
            let reason = latest.as_ref().and_then(|e| e.resource_status_reason.clone());
            let class = status
                .as_deref()
                .map(StatusClass::classify)
                .unwrap_or(StatusClass::Unknown);

            if class.is_terminal() {
                let status = status.unwrap_or_default();
                info!("Stack {} finished: {}", self.stack_name, status);
                return Ok(WaitOutcome {
                    status,
                    class,
                    reason,
                });
            }

            if let (StatusClass::Unknown, Some(status)) = (class, &status) {
                warn!("Stack {} reports unrecognised status {}", self.stack_name, status);
            }

            let progress = reason
                .as_deref()
                .or(status.as_deref())
                .unwrap_or("waiting for first event");
            if options.quiet {
                debug!("{} status: {}", self.stack_name, progress);
            } else {
                info!("{} status: {}", self.stack_name, progress);
            }

            if let Some(timeout) = options.timeout {
                if started.elapsed() >= timeout {
                    return Err(StackError::WaitTimeout {
                        stack: self.stack_name.clone(),
                        seconds: timeout.as_secs(),
                    });
                }
            }

            tokio::time::sleep(options.interval).await;
        }
    }

    /// Exported outputs; empty when the stack has none.
    pub async fn output(&mut self) -> StackResult<BTreeMap<String, String>> {
        let session = self.session().await?;
        let outputs = self
            .api
            .describe_outputs(&session, &self.stack_name)
            .await?;
        Ok(outputs
            .into_iter()
            .map(|o| (o.output_key, o.output_value))
            .collect())
    }

    /// Validate the template remotely.
    pub async fn validate(&mut self) -> StackResult<TemplateValidation> {
        let body = self.template_json()?;
        let session = self.session().await?;
        self.api.validate_template(&session, &body).await
    }
}

impl std::fmt::Debug for StackDeployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackDeployment")
            .field("stack_name", &self.stack_name)
            .field("template", &self.template)
            .field("tags", &self.tags)
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{DeployContext, ROOT_PROFILE};
    use crate::mock::{MockStackApi, StaticRoleAssumer};
    use chrono::{Duration as ChronoDuration, Utc};

    fn deployment(api: &MockStackApi) -> StackDeployment {
        let context = DeployContext::new("arn:aws:iam::1:role/build", ROOT_PROFILE, "dev");
        let provider = CredentialProvider::new(&context, Arc::new(StaticRoleAssumer::default()));
        StackDeployment::new("devBuild", Arc::new(api.clone()), provider)
    }

    #[test]
    fn test_default_query_is_terminal() {
        let query = StackQuery::new();
        assert!(query.matches("devBuild", &StackSummary::new("devBuild", "UPDATE_COMPLETE")));
        assert!(!query.matches("devBuild", &StackSummary::new("devBuild", "UPDATE_IN_PROGRESS")));
        assert!(!query.matches("devBuild", &StackSummary::new("prodBuild", "UPDATE_COMPLETE")));
        assert!(StackQuery::new()
            .any_status()
            .matches("devBuild", &StackSummary::new("devBuild", "WHATEVER")));
    }

    #[test]
    fn test_wait_defaults() {
        let options = WaitOptions::default();
        assert!(options.quiet);
        assert_eq!(options.interval, Duration::from_secs(1));
        assert_eq!(options.timeout, Some(Duration::from_secs(1800)));
        assert!(!options.with_progress().quiet);
    }

    #[tokio::test]
    async fn test_pending_ignores_resource_events() {
        let now = Utc::now();
        let api = MockStackApi::new().with_events(
            "devBuild",
            vec![
                StackEvent::for_resource(
                    "devBuild",
                    "devBuildRole",
                    "AWS::IAM::Role",
                    "CREATE_COMPLETE",
                    now,
                ),
                StackEvent::for_stack("devBuild", "CREATE_IN_PROGRESS", now - ChronoDuration::seconds(5)),
            ],
        );
        assert!(deployment(&api).pending().await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let api = MockStackApi::new().with_events(
            "devBuild",
            vec![StackEvent::for_stack("devBuild", "UPDATE_IN_PROGRESS", Utc::now())],
        );
        let options = WaitOptions::new()
            .quiet()
            .interval(Duration::from_millis(5))
            .timeout(Duration::from_millis(20));

        let result = deployment(&api).wait(&options).await;
        assert!(matches!(result, Err(StackError::WaitTimeout { .. })));
    }

    #[tokio::test]
    async fn test_operations_without_template() {
        let api = MockStackApi::new();
        let mut deployment = deployment(&api);
        assert!(matches!(
            deployment.template_json(),
            Err(StackError::MissingTemplate(name)) if name == "devBuild"
        ));
        assert!(matches!(
            deployment.create(StackOverrides::new()).await,
            Err(StackError::MissingTemplate(_))
        ));
        assert!(!api.was_called("create_stack"));
    }
}
