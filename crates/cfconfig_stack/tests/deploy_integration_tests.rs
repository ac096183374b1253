//! Integration tests for the stack deployment orchestrator.
//!
//! These tests drive `StackDeployment` against the in-memory mock API, so
//! no account or `aws` executable is needed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;

use cfconfig_stack::{
    BuildAction, CredentialProvider, Credentials, DeployContext, EventAttribute, EventQuery,
    MockStackApi, Session, StackDeployment, StackError, StackEvent, StackOutput, StackOverrides,
    StackQuery, StaticRoleAssumer, StatusClass, WaitOptions,
};
use cfconfig_template::{
    OutputValue, ResourceType, StackTemplate, StatementBuilder, TagSet, Template,
    TemplateBuilder, TemplateResult,
};

const STACK: &str = "devBuildSystem";
const ROLE: &str = "arn:aws:iam::123456789012:role/devCFconfigBuildRole";

fn role_template(b: &TemplateBuilder) -> TemplateResult<Template> {
    let policy = b.build_policy(
        "CFRolePolicy",
        [StatementBuilder::allow("sts:AssumeRole").on("*").build()?],
    );
    let role = b.resource("BuildRole", ResourceType::Role).policy(policy).build()?;
    let output = b.build_output("RoleArn", OutputValue::from(b.arn("BuildRole")));
    b.build_template(vec![role], vec![], vec![output])
}

fn deployment(api: &MockStackApi, assumer: &StaticRoleAssumer) -> StackDeployment {
    let context = DeployContext::new(ROLE, "deploy", "dev");
    let provider = CredentialProvider::new(&context, Arc::new(assumer.clone()));
    StackDeployment::new(STACK, Arc::new(api.clone()), provider)
        .with_template(StackTemplate::new(TemplateBuilder::new("dev"), role_template))
}

fn fast_wait() -> WaitOptions {
    WaitOptions::new()
        .quiet()
        .interval(Duration::from_millis(1))
        .timeout(Duration::from_secs(5))
}

/// No matching stack means create.
#[tokio::test]
async fn test_build_creates_missing_stack() {
    let api = MockStackApi::new().add_stack("devOtherStack", "CREATE_COMPLETE");
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer);

    let action = deployment.build(true).await.unwrap();

    assert!(matches!(action, BuildAction::Created { .. }));
    assert!(api.was_called("create_stack"));
    assert!(!api.was_called("update_stack"));

    let request = api.get_method_calls("create_stack")[0].request.clone().unwrap();
    assert_eq!(request.stack_name, STACK);
    assert!(!request.disable_rollback);
    assert_eq!(request.capabilities, vec!["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"]);
    assert!(request.template_body.ends_with('\n'));

    let body: serde_json::Value = serde_json::from_str(&request.template_body).unwrap();
    assert_eq!(body["Resources"]["devBuildRole"]["Type"], json!("AWS::IAM::Role"));
}

/// One terminal match means update.
#[tokio::test]
async fn test_build_updates_completed_stack() {
    let api = MockStackApi::new().add_stack(STACK, "CREATE_COMPLETE");
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer);

    let action = deployment.build(false).await.unwrap();

    assert!(matches!(action, BuildAction::Updated { .. }));
    let request = api.get_method_calls("update_stack")[0].request.clone().unwrap();
    assert!(request.disable_rollback);
}

/// A stack still in progress is not found by the default query.
#[tokio::test]
async fn test_find_respects_status_filter() {
    let api = MockStackApi::new().add_stack(STACK, "UPDATE_IN_PROGRESS");
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer);

    assert!(deployment.find(&StackQuery::new()).await.unwrap().is_empty());
    let any = deployment.find(&StackQuery::new().any_status()).await.unwrap();
    assert_eq!(any.len(), 1);
}

/// Every call runs under the assumed session, resolved once.
#[tokio::test]
async fn test_credentials_assumed_once_across_calls() {
    let api = MockStackApi::new().add_stack(STACK, "UPDATE_COMPLETE");
    let assumer = StaticRoleAssumer::new(Credentials::new("ASIA1", "s", "t"));
    let mut deployment = deployment(&api, &assumer);

    deployment.build(true).await.unwrap();
    deployment.output().await.unwrap();

    assert_eq!(assumer.call_count(), 1);
    assert!(api
        .get_calls()
        .iter()
        .all(|c| matches!(&c.session, Session::Assumed(creds) if creds.access_key_id == "ASIA1")));

    deployment.credentials_mut().invalidate();
    deployment.list().await.unwrap();
    assert_eq!(assumer.call_count(), 2);
}

/// Terminal statuses end pending; in-progress keeps it.
#[tokio::test]
async fn test_pending_classification() {
    let cases = [
        ("CREATE_COMPLETE", false),
        ("UPDATE_FAILED", false),
        ("ROLLBACK_COMPLETE", false),
        ("CREATE_IN_PROGRESS", true),
        ("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS", true),
    ];

    for (status, expected) in cases {
        let api = MockStackApi::new()
            .with_events(STACK, vec![StackEvent::for_stack(STACK, status, Utc::now())]);
        let assumer = StaticRoleAssumer::default();
        let mut deployment = deployment(&api, &assumer);
        assert_eq!(deployment.pending().await.unwrap(), expected, "status {}", status);
    }
}

/// Wait polls until the stack settles.
#[tokio::test]
async fn test_wait_until_terminal() {
    let start = Utc::now();
    let api = MockStackApi::new().with_event_sequence(
        STACK,
        vec![
            vec![StackEvent::for_stack(STACK, "CREATE_IN_PROGRESS", start)],
            vec![
                StackEvent::for_resource(STACK, "devBuildRole", "AWS::IAM::Role", "CREATE_IN_PROGRESS", start + ChronoDuration::seconds(1)),
                StackEvent::for_stack(STACK, "CREATE_IN_PROGRESS", start),
            ],
            vec![
                StackEvent::for_stack(STACK, "ROLLBACK_COMPLETE", start + ChronoDuration::seconds(3))
                    .with_reason("The following resource(s) failed to create: [devBuildRole]."),
                StackEvent::for_resource(STACK, "devBuildRole", "AWS::IAM::Role", "CREATE_FAILED", start + ChronoDuration::seconds(2)),
            ],
        ],
    );
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer);

    let outcome = deployment.wait(&fast_wait()).await.unwrap();

    assert_eq!(outcome.status, "ROLLBACK_COMPLETE");
    assert_eq!(outcome.class, StatusClass::Rollback);
    assert!(!outcome.succeeded());
    assert_eq!(api.get_method_calls("describe_events").len(), 3);
}

/// Status, failures and projections.
#[tokio::test]
async fn test_event_views() {
    let start = Utc::now();
    let api = MockStackApi::new().with_events(
        STACK,
        vec![
            StackEvent::for_stack(STACK, "UPDATE_ROLLBACK_COMPLETE", start + ChronoDuration::seconds(4)),
            StackEvent::for_resource(STACK, "devBuildUser", "AWS::IAM::User", "UPDATE_FAILED", start + ChronoDuration::seconds(2))
                .with_reason("User already exists"),
            StackEvent::for_stack(STACK, "UPDATE_IN_PROGRESS", start),
        ],
    );
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer);

    let status = deployment.status().await.unwrap().unwrap();
    assert_eq!(status.status(), Some("UPDATE_ROLLBACK_COMPLETE"));
    assert_eq!(status.as_map().len(), EventAttribute::standard().len());

    let failures = deployment.failure().await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].reason(), Some("User already exists"));

    assert!(deployment.success().await.unwrap().is_empty());
    assert_eq!(deployment.finished().await.unwrap().len(), 2);

    let limited = deployment
        .events(&EventQuery::standard().with_limit(2))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}

/// Outputs come back as a key/value mapping.
#[tokio::test]
async fn test_output_mapping() {
    let api = MockStackApi::new()
        .with_outputs(
            STACK,
            vec![
                StackOutput::new("RoleName", "devCFconfigBuildRole"),
                StackOutput::new("BuildSystemGroupName", "devCFconfigBuildGroup"),
            ],
        );
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer);

    let outputs = deployment.output().await.unwrap();
    assert_eq!(outputs.get("RoleName").map(String::as_str), Some("devCFconfigBuildRole"));
    assert_eq!(outputs.len(), 2);

    let empty = MockStackApi::new();
    let mut deployment = self::deployment(&empty, &assumer);
    assert!(deployment.output().await.unwrap().is_empty());
}

/// Overrides and stack tags reach the payload.
#[tokio::test]
async fn test_create_with_overrides_and_tags() {
    let api = MockStackApi::new();
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer)
        .with_tags(TagSet::new().with("environment", "dev").with("region", "us-west-2"));

    deployment
        .create(StackOverrides::new().template_body("{}").stack_name("devScratch"))
        .await
        .unwrap();

    let request = api.get_method_calls("create_stack")[0].request.clone().unwrap();
    assert_eq!(request.stack_name, "devScratch");
    assert_eq!(request.template_body, "{}");
    assert_eq!(request.tags.get("region"), Some("us-west-2"));
}

/// API failures are passed through verbatim.
#[tokio::test]
async fn test_api_errors_surface_unmodified() {
    let api = MockStackApi::new().simulate_failure("No updates are to be performed.");
    let assumer = StaticRoleAssumer::default();
    let mut deployment = deployment(&api, &assumer);

    let err = deployment.build(true).await.unwrap_err();
    assert!(matches!(err, StackError::Api { .. }));
    assert_eq!(err.to_string(), "No updates are to be performed.");
}
