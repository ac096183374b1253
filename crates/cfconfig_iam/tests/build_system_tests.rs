//! Integration tests for the build-system template.

use serde_json::json;

use cfconfig_iam::{BuildSystemTemplate, TemplateRegistry, STACK_NAME};
use cfconfig_template::{StackTemplate, TemplateBuilder};

#[test]
fn test_build_system_json_is_deterministic() {
    let registry = TemplateRegistry::new();
    let first = registry.template_for(STACK_NAME, "dev").unwrap().to_json().unwrap();
    let second = registry.template_for(STACK_NAME, "dev").unwrap().to_json().unwrap();

    assert_eq!(first, second);
    assert!(first.starts_with("{\n  \"AWSTemplateFormatVersion\": \"2010-09-09\""));
    assert!(first.ends_with("}\n"));
}

#[test]
fn test_custom_assume_scope() {
    let source = BuildSystemTemplate::new()
        .with_assume_operations(vec!["cloudformation:*".into(), "s3:*".into()])
        .with_assume_resources(vec!["arn:aws:s3:::dev-*".into()]);
    let mut template = StackTemplate::new(TemplateBuilder::new("dev"), source);

    let value = template.to_value().unwrap();
    let statement = &value["Resources"]["devCFconfigBuildRole"]["Properties"]["Policies"][0]
        ["PolicyDocument"]["Statement"][0];

    assert_eq!(statement["Action"], json!(["cloudformation:*", "s3:*"]));
    assert_eq!(statement["Resource"], json!(["arn:aws:s3:::dev-*"]));
}

#[test]
fn test_dependency_chain() {
    let value = TemplateRegistry::new()
        .template_for(STACK_NAME, "dev")
        .unwrap()
        .to_value()
        .unwrap();
    let resources = &value["Resources"];

    assert!(resources["devCFconfigBuildRole"].get("DependsOn").is_none());
    assert_eq!(resources["devCFconfigBuildGroup"]["DependsOn"], json!("devCFconfigBuildRole"));
    assert_eq!(resources["devCFconfigBuildUser"]["DependsOn"], json!("devCFconfigBuildGroup"));
    assert_eq!(
        resources["devCFconfigBuilderCredentails"]["DependsOn"],
        json!("devCFconfigBuildUser")
    );
    assert_eq!(
        resources["devCFconfigBuildUser"]["Properties"]["Groups"],
        json!(["devConfigDeployGroup"])
    );
}

#[test]
fn test_yaml_view() {
    let mut template = TemplateRegistry::new().template_for(STACK_NAME, "dev").unwrap();
    let yaml = template.to_yaml().unwrap();
    assert!(yaml.contains("AWSTemplateFormatVersion"));
    assert!(yaml.contains("devCFconfigBuildRole"));
}
