//! The build-system stack: a role that may drive CloudFormation, a group
//! allowed to assume only that role, a user in the group and its access key.

use serde_json::json;

use cfconfig_template::{
    Intrinsic, PolicyDocument, ResourceType, StatementBuilder, TagSet, Template, TemplateBuilder,
    TemplateResult, TemplateSource,
};

pub const STACK_NAME: &str = "config-build-system";
pub const SYSTEM_NAME: &str = "config-build";
pub const COMPONENT_NAME: &str = "config-deploy";

pub const USER_NAME: &str = "ConfigDeployUser";
pub const GROUP_NAME: &str = "ConfigDeployGroup";

pub const ROLE_ACTION: &str = "sts:AssumeRole";
pub const ACCOUNT_ID_PARAMETER: &str = "AWS::AccountId";

pub const ROLE_POLICY_NAME: &str = "CFRolePolicy";
pub const GROUP_POLICY_NAME: &str = "CFGroupPolicy";

pub const IAM_ROLE: &str = "CFconfigBuildRole";
pub const IAM_GROUP: &str = "CFconfigBuildGroup";
pub const IAM_USER: &str = "CFconfigBuildUser";
pub const IAM_CREDENTIALS: &str = "CFconfigBuilderCredentails";

/// Tags carried by every build-system resource and the stack itself.
pub fn build_system_tags() -> TagSet {
    TagSet::from_pairs([("System", SYSTEM_NAME), ("Component", COMPONENT_NAME)])
}

/// Template for the build-system stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSystemTemplate {
    /// Actions the build role is granted.
    pub assume_operations: Vec<String>,
    /// Resources those actions apply to.
    pub assume_resources: Vec<String>,
}

impl Default for BuildSystemTemplate {
    fn default() -> Self {
        Self {
            assume_operations: vec!["cloudformation:*".to_string()],
            assume_resources: vec!["*".to_string()],
        }
    }
}

impl BuildSystemTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assume_operations(mut self, operations: Vec<String>) -> Self {
        self.assume_operations = operations;
        self
    }

    pub fn with_assume_resources(mut self, resources: Vec<String>) -> Self {
        self.assume_resources = resources;
        self
    }

    /// Trust policy letting principals of the same account assume the role.
    fn role_trust_policy(&self) -> TemplateResult<PolicyDocument> {
        Ok(PolicyDocument::new([StatementBuilder::allow(ROLE_ACTION)
            .principal(json!({ "AWS": Intrinsic::reference(ACCOUNT_ID_PARAMETER) }))
            .build()?]))
    }
}

impl TemplateSource for BuildSystemTemplate {
    fn name(&self) -> &str {
        STACK_NAME
    }

    fn construct(&self, b: &TemplateBuilder) -> TemplateResult<Template> {
        let env = b.environment();
        let role_name = format!("{}{}", env, IAM_ROLE);
        let group_name = format!("{}{}", env, GROUP_NAME);
        let user_name = format!("{}{}", env, USER_NAME);

        let role_policy = b.build_policy(
            ROLE_POLICY_NAME,
            [StatementBuilder::allow(self.assume_operations.clone())
                .on(self.assume_resources.clone())
                .build()?],
        );

        let group_policy = b.build_policy(
            GROUP_POLICY_NAME,
            [StatementBuilder::allow(ROLE_ACTION)
                .on(b.arn(IAM_ROLE))
                .deny_other()
                .build()?],
        );

        let role = b
            .resource(IAM_ROLE, ResourceType::Role)
            .policy(role_policy)
            .property("RoleName", &role_name)
            .property("AssumeRolePolicyDocument", self.role_trust_policy()?)
            .build()?;

        let group = b
            .resource(IAM_GROUP, ResourceType::Group)
            .policy(group_policy)
            .property("GroupName", &group_name)
            .depends_on(IAM_ROLE)
            .build()?;

        let user = b
            .resource(IAM_USER, ResourceType::User)
            .property("UserName", &user_name)
            .property("Groups", [&group_name])
            .depends_on(IAM_GROUP)
            .build()?;

        let access_key = b
            .resource(IAM_CREDENTIALS, ResourceType::AccessKey)
            .property("UserName", b.reference(IAM_USER))
            .depends_on(IAM_USER)
            .build()?;

        let outputs = vec![
            b.build_output("BuildSystemGroupName", group_name),
            b.build_output("BuildSystemGroupARN", b.arn(IAM_GROUP)),
            b.build_output("BuildSystemUserName", user_name),
            b.build_output("BuildSystemUserARN", b.arn(IAM_USER)),
            b.build_output("BuildSystemRoleName", role_name),
            b.build_output("BuildSystemRoleARN", b.arn(IAM_ROLE)),
            b.build_output("BuildUserAccessId", b.reference(IAM_CREDENTIALS)),
            b.build_output(
                "BuildUserAccessSecret",
                b.attribute(IAM_CREDENTIALS, "SecretAccessKey"),
            ),
        ];

        b.build_template(vec![role, group, user, access_key], vec![], outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(environment: &str) -> serde_json::Value {
        let builder = TemplateBuilder::new(environment).with_tags(build_system_tags());
        BuildSystemTemplate::new()
            .construct(&builder)
            .unwrap()
            .to_value()
            .unwrap()
    }

    #[test]
    fn test_resources_and_order() {
        let value = build("dev");
        let names: Vec<_> = value["Resources"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            names,
            vec![
                "devCFconfigBuildRole",
                "devCFconfigBuildGroup",
                "devCFconfigBuildUser",
                "devCFconfigBuilderCredentails"
            ]
        );
    }

    #[test]
    fn test_group_policy_denies_other_roles() {
        let value = build("dev");
        let statements = &value["Resources"]["devCFconfigBuildGroup"]["Properties"]["Policies"][0]
            ["PolicyDocument"]["Statement"];
        let role_arn = json!([{"Fn::GetAtt": ["devCFconfigBuildRole", "Arn"]}]);

        assert_eq!(statements[0]["Effect"], json!("Allow"));
        assert_eq!(statements[0]["Resource"], role_arn);
        assert_eq!(statements[1]["Effect"], json!("Deny"));
        assert_eq!(statements[1]["NotResource"], role_arn);
    }

    #[test]
    fn test_trust_policy_principal() {
        let value = build("prod");
        let trust = &value["Resources"]["prodCFconfigBuildRole"]["Properties"]
            ["AssumeRolePolicyDocument"];
        assert_eq!(trust["Version"], json!("2012-10-17"));
        assert_eq!(
            trust["Statement"][0]["Principal"],
            json!({"AWS": {"Ref": "AWS::AccountId"}})
        );
        assert!(trust["Statement"][0].get("Resource").is_none());
    }

    #[test]
    fn test_tags_skip_group_and_access_key() {
        let value = build("dev");
        let resources = &value["Resources"];
        assert!(resources["devCFconfigBuildRole"]["Properties"].get("Tags").is_some());
        assert!(resources["devCFconfigBuildUser"]["Properties"].get("Tags").is_some());
        assert!(resources["devCFconfigBuildGroup"]["Properties"].get("Tags").is_none());
        assert!(resources["devCFconfigBuilderCredentails"].get("Properties").is_some());
        assert!(resources["devCFconfigBuilderCredentails"]["Properties"].get("Tags").is_none());
    }

    #[test]
    fn test_outputs() {
        let value = build("dev");
        let outputs = &value["Outputs"];
        assert_eq!(outputs.as_object().unwrap().len(), 8);
        assert_eq!(outputs["BuildSystemGroupName"]["Value"], json!("devConfigDeployGroup"));
        assert_eq!(
            outputs["BuildUserAccessId"]["Value"],
            json!({"Ref": "devCFconfigBuilderCredentails"})
        );
        assert_eq!(
            outputs["BuildUserAccessSecret"]["Value"],
            json!({"Fn::GetAtt": ["devCFconfigBuilderCredentails", "SecretAccessKey"]})
        );
    }
}
