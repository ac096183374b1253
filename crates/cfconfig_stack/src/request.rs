//! Create/update payloads.

use serde::{Deserialize, Serialize};

use cfconfig_template::TagSet;

/// Capabilities acknowledged on every create and update.
pub const DEFAULT_CAPABILITIES: [&str; 2] = ["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"];

/// Payload for `CreateStack` and `UpdateStack`, serialized as the API's
/// input JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackRequest {
    pub stack_name: String,
    pub disable_rollback: bool,
    pub capabilities: Vec<String>,
    pub template_body: String,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(rename = "RoleARN", default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
}

impl StackRequest {
    pub fn new(stack_name: impl Into<String>, template_body: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            disable_rollback: false,
            capabilities: DEFAULT_CAPABILITIES.iter().map(|c| c.to_string()).collect(),
            template_body: template_body.into(),
            tags: TagSet::new(),
            role_arn: None,
        }
    }

    /// Input JSON for the API call.
    pub fn to_input_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Caller overrides for a create or update. Set fields win over the
/// computed defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackOverrides {
    pub stack_name: Option<String>,
    pub disable_rollback: Option<bool>,
    pub capabilities: Option<Vec<String>>,
    pub template_body: Option<String>,
    pub tags: Option<TagSet>,
    pub role_arn: Option<String>,
}

impl StackOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack_name(mut self, name: impl Into<String>) -> Self {
        self.stack_name = Some(name.into());
        self
    }

    pub fn disable_rollback(mut self, disable: bool) -> Self {
        self.disable_rollback = Some(disable);
        self
    }

    pub fn capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn template_body(mut self, body: impl Into<String>) -> Self {
        self.template_body = Some(body.into());
        self
    }

    pub fn tags(mut self, tags: TagSet) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn role_arn(mut self, arn: impl Into<String>) -> Self {
        self.role_arn = Some(arn.into());
        self
    }

    pub fn apply(self, mut request: StackRequest) -> StackRequest {
        if let Some(name) = self.stack_name {
            request.stack_name = name;
        }
        if let Some(disable) = self.disable_rollback {
            request.disable_rollback = disable;
        }
        if let Some(capabilities) = self.capabilities {
            request.capabilities = capabilities;
        }
        if let Some(body) = self.template_body {
            request.template_body = body;
        }
        if let Some(tags) = self.tags {
            request.tags = tags;
        }
        if let Some(arn) = self.role_arn {
            request.role_arn = Some(arn);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let request = StackRequest::new("devBuild", "{}\n");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "StackName": "devBuild",
                "DisableRollback": false,
                "Capabilities": ["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"],
                "TemplateBody": "{}\n"
            })
        );
    }

    #[test]
    fn test_overrides_win() {
        let request = StackRequest::new("devBuild", "{}");
        let request = StackOverrides::new()
            .stack_name("devOther")
            .disable_rollback(true)
            .tags(TagSet::new().with("env", "dev"))
            .role_arn("arn:aws:iam::1:role/cfn")
            .apply(request);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["StackName"], json!("devOther"));
        assert_eq!(value["DisableRollback"], json!(true));
        assert_eq!(value["Tags"], json!([{"Key": "env", "Value": "dev"}]));
        assert_eq!(value["RoleARN"], json!("arn:aws:iam::1:role/cfn"));
        assert_eq!(value["TemplateBody"], json!("{}"));
    }
}
