//! Integration tests for template construction.

use cfconfig_template::{
    Effect, OutputValue, ResourceType, StackTemplate, StatementBuilder, Template, TemplateBuilder,
    TemplateResult,
};
use serde_json::{json, Map};

fn build_role_template(builder: &TemplateBuilder) -> TemplateResult<Template> {
    let policy = builder.build_policy(
        "BuildRolePolicy",
        [builder.build_statement("sts:AssumeRole", "*", Effect::Allow, false, Map::new())?],
    );

    let role = builder
        .resource("BuildRole", ResourceType::Role)
        .policy(policy)
        .build()?;

    builder.build_template(
        vec![role],
        vec![],
        vec![builder.build_output("BuildRoleArn", OutputValue::from(builder.arn("BuildRole")))],
    )
}

#[test]
fn test_end_to_end_role_template() {
    let builder = TemplateBuilder::new("dev");
    let template = build_role_template(&builder).unwrap();
    let value: serde_json::Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();

    assert_eq!(value["AWSTemplateFormatVersion"], json!("2010-09-09"));
    assert_eq!(value["Resources"]["devBuildRole"]["Type"], json!("AWS::IAM::Role"));
    assert_eq!(
        value["Outputs"]["BuildRoleArn"]["Value"],
        json!({"Fn::GetAtt": ["devBuildRole", "Arn"]})
    );

    let statement = &value["Resources"]["devBuildRole"]["Properties"]["Policies"][0]["PolicyDocument"]
        ["Statement"][0];
    assert_eq!(statement, &json!({"Effect": "Allow", "Action": ["sts:AssumeRole"], "Resource": ["*"]}));

    // No builder tags, so no Tags property.
    assert!(value["Resources"]["devBuildRole"]["Properties"].get("Tags").is_none());
}

#[test]
fn test_serialization_is_deterministic() {
    let builder = TemplateBuilder::new("test")
        .with_tag("System", "config-build")
        .with_tag("Component", "config-deploy");

    let first = build_role_template(&builder).unwrap().to_json().unwrap();
    let second = build_role_template(&builder).unwrap().to_json().unwrap();

    assert_eq!(first, second);
    assert!(first.ends_with('\n'));
    assert!(first.starts_with("{\n  \"AWSTemplateFormatVersion\""));
}

#[test]
fn test_key_order_follows_insertion() {
    let builder = TemplateBuilder::new("dev");
    let zeta = builder.resource("Zeta", ResourceType::User).build().unwrap();
    let alpha = builder.resource("Alpha", ResourceType::User).build().unwrap();
    let template = builder.build_template(vec![zeta, alpha], vec![], vec![]).unwrap();

    let value = template.to_value().unwrap();
    let names: Vec<_> = value["Resources"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(names, vec!["devZeta", "devAlpha"]);
}

#[test]
fn test_standalone_policies_and_empty_sections() {
    let builder = TemplateBuilder::new("dev");
    let policy = builder.build_policy(
        "Standalone",
        [StatementBuilder::allow("s3:GetObject").on("arn:x").deny_other().build().unwrap()],
    );

    let template = builder.build_template(vec![], vec![policy], vec![]).unwrap();
    let value = template.to_value().unwrap();

    assert_eq!(value["Resources"], json!({}));
    assert_eq!(value["Policies"][0]["PolicyName"], json!("devStandalone"));
    assert_eq!(
        value["Policies"][0]["PolicyDocument"]["Statement"][1],
        json!({"Effect": "Deny", "Action": ["s3:GetObject"], "NotResource": ["arn:x"]})
    );
    assert!(value.get("Outputs").is_none());
}

#[test]
fn test_tag_inheritance_across_types() {
    let builder = TemplateBuilder::new("dev").with_tag("env", "dev");
    let template = builder
        .build_template(
            vec![
                builder.resource("Role", ResourceType::Role).build().unwrap(),
                builder.resource("User", ResourceType::User).build().unwrap(),
                builder.resource("Group", ResourceType::Group).build().unwrap(),
                builder.resource("Key", ResourceType::AccessKey).build().unwrap(),
            ],
            vec![],
            vec![],
        )
        .unwrap();

    let value = template.to_value().unwrap();
    let tagged = json!([{"Key": "env", "Value": "dev"}]);
    assert_eq!(value["Resources"]["devRole"]["Properties"]["Tags"], tagged);
    assert_eq!(value["Resources"]["devUser"]["Properties"]["Tags"], tagged);
    assert!(value["Resources"]["devGroup"].get("Properties").is_none());
    assert!(value["Resources"]["devKey"].get("Properties").is_none());
}

#[test]
fn test_stack_template_yaml_view() {
    let mut stack_template = StackTemplate::new(TemplateBuilder::new("dev"), build_role_template);
    let yaml = stack_template.to_yaml().unwrap();
    assert!(yaml.contains("devBuildRole"));
    assert!(yaml.contains("AWS::IAM::Role"));
}
