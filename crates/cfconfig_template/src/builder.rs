//! Environment-scoped template builder.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::names::{Intrinsic, LogicalName};
use crate::output::{Output, OutputValue, DEFAULT_ATTRIBUTE};
use crate::policy::{Policy, PolicyDocument};
use crate::resource::{Resource, ResourceType};
use crate::statement::{build_statement, ActionList, Effect, ResourceList, Statement};
use crate::tags::TagSet;
use crate::template::Template;

/// Builds IR fragments for one environment.
///
/// Every `build_*` call is pure: the builder only carries the environment
/// prefix and the tags inherited by taggable resources.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    environment: String,
    tags: TagSet,
}

impl TemplateBuilder {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            tags: TagSet::new(),
        }
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Qualify a name with this builder's environment.
    pub fn name(&self, name: impl Into<String>) -> LogicalName {
        LogicalName::new(self.environment.clone(), name)
    }

    pub fn build_statement(
        &self,
        actions: impl Into<ActionList>,
        resources: impl Into<ResourceList>,
        effect: Effect,
        deny_other: bool,
        extra: Map<String, Value>,
    ) -> TemplateResult<Vec<Statement>> {
        build_statement(actions, resources, effect, deny_other, extra)
    }

    /// Named policy from one or more statement lists.
    pub fn build_policy<I>(&self, name: impl Into<String>, statements: I) -> Policy
    where
        I: IntoIterator<Item = Vec<Statement>>,
    {
        Policy::new(self.name(name), PolicyDocument::new(statements))
    }

    /// Start a resource of a known type.
    pub fn resource(&self, name: impl Into<String>, resource_type: ResourceType) -> ResourceBuilder {
        ResourceBuilder {
            name: self.name(name),
            environment: self.environment.clone(),
            resource_type,
            path: None,
            properties: Map::new(),
            policies: Vec::new(),
            tags: self.tags.clone(),
            depends_on: None,
            error: None,
        }
    }

    /// Start a resource from a type string such as `AWS::IAM::Role`.
    pub fn resource_of(
        &self,
        name: impl Into<String>,
        resource_type: &str,
    ) -> TemplateResult<ResourceBuilder> {
        let resource_type = resource_type.parse::<ResourceType>()?;
        Ok(self.resource(name, resource_type))
    }

    pub fn build_output(&self, key: impl Into<String>, value: impl Into<OutputValue>) -> Output {
        Output::new(key, value)
    }

    /// `Ref` to a resource of this environment.
    pub fn reference(&self, name: &str) -> Intrinsic {
        Intrinsic::Ref(self.name(name).rendered())
    }

    /// `Fn::GetAtt` on a resource of this environment.
    pub fn attribute(&self, name: &str, attribute: &str) -> Intrinsic {
        Intrinsic::get_att(self.name(name).rendered(), attribute)
    }

    /// `Fn::GetAtt` of the `Arn` attribute.
    pub fn arn(&self, name: &str) -> Intrinsic {
        self.attribute(name, DEFAULT_ATTRIBUTE)
    }

    pub fn build_template(
        &self,
        resources: Vec<Resource>,
        policies: Vec<Policy>,
        outputs: Vec<Output>,
    ) -> TemplateResult<Template> {
        debug!(
            environment = %self.environment,
            resources = resources.len(),
            policies = policies.len(),
            outputs = outputs.len(),
            "Assembling template"
        );
        Template::new(resources, policies, outputs)
    }
}

/// Builder for a single resource.
#[derive(Debug)]
pub struct ResourceBuilder {
    name: LogicalName,
    environment: String,
    resource_type: ResourceType,
    path: Option<String>,
    properties: Map<String, Value>,
    policies: Vec<Policy>,
    tags: TagSet,
    depends_on: Option<LogicalName>,
    error: Option<TemplateError>,
}

impl ResourceBuilder {
    /// Attach an inline policy.
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn policies(mut self, policies: impl IntoIterator<Item = Policy>) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Set a property. Serialization failures are reported by `build()`.
    pub fn property(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.properties.insert(key, value);
            }
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(TemplateError::InvalidProperty {
                        resource: self.name.rendered(),
                        property: key,
                        message: e.to_string(),
                    });
                }
            }
        }
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Depend on another resource of the same environment.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on = Some(LogicalName::new(self.environment.clone(), name));
        self
    }

    pub fn build(self) -> TemplateResult<Resource> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let tags = if self.resource_type.carries_tags() {
            self.tags
        } else {
            TagSet::new()
        };

        debug!(
            resource = %self.name,
            resource_type = %self.resource_type,
            policies = self.policies.len(),
            tagged = !tags.is_empty(),
            "Built resource"
        );

        Ok(Resource {
            name: self.name,
            resource_type: self.resource_type,
            path: self.path,
            properties: self.properties,
            policies: self.policies,
            tags,
            depends_on: self.depends_on,
        })
    }
}
