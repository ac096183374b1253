//! Template resources.

use std::str::FromStr;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TemplateError;
use crate::names::LogicalName;
use crate::policy::Policy;
use crate::tags::TagSet;

/// Supported resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    User,
    Group,
    Role,
    AccessKey,
    Policy,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::User => "AWS::IAM::User",
            ResourceType::Group => "AWS::IAM::Group",
            ResourceType::Role => "AWS::IAM::Role",
            ResourceType::AccessKey => "AWS::IAM::AccessKey",
            ResourceType::Policy => "AWS::IAM::Policy",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            ResourceType::User,
            ResourceType::Group,
            ResourceType::Role,
            ResourceType::AccessKey,
            ResourceType::Policy,
        ]
    }

    /// Whether CloudFormation accepts a `Tags` property on this type.
    ///
    /// Groups, access keys and inline policy resources reject tags.
    pub fn carries_tags(&self) -> bool {
        !matches!(
            self,
            ResourceType::Group | ResourceType::AccessKey | ResourceType::Policy
        )
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = TemplateError;

    /// Accepts the full CloudFormation type name or its short form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.strip_prefix("AWS::IAM::").unwrap_or(s);
        match short.to_lowercase().as_str() {
            "user" => Ok(ResourceType::User),
            "group" => Ok(ResourceType::Group),
            "role" => Ok(ResourceType::Role),
            "accesskey" => Ok(ResourceType::AccessKey),
            "policy" => Ok(ResourceType::Policy),
            _ => Err(TemplateError::UnknownResourceType(s.to_string())),
        }
    }
}

impl Serialize for ResourceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One infrastructure object in a template.
///
/// `tags` holds the tags that will actually be emitted; the builder leaves
/// it empty for types that do not carry tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: LogicalName,
    pub resource_type: ResourceType,
    pub path: Option<String>,
    pub properties: Map<String, Value>,
    pub policies: Vec<Policy>,
    pub tags: TagSet,
    pub depends_on: Option<LogicalName>,
}

impl Resource {
    fn has_properties(&self) -> bool {
        !self.properties.is_empty() || !self.policies.is_empty() || !self.tags.is_empty()
    }
}

struct PropertiesView<'a>(&'a Resource);

impl Serialize for PropertiesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let resource = self.0;
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &resource.properties {
            map.serialize_entry(key, value)?;
        }
        if !resource.policies.is_empty() {
            map.serialize_entry("Policies", &resource.policies)?;
        }
        if !resource.tags.is_empty() {
            map.serialize_entry("Tags", &resource.tags)?;
        }
        map.end()
    }
}

/// Serializes the resource body; the logical name is the key it is stored
/// under in the template.
impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Type", &self.resource_type)?;
        if let Some(path) = &self.path {
            map.serialize_entry("Path", path)?;
        }
        if self.has_properties() {
            map.serialize_entry("Properties", &PropertiesView(self))?;
        }
        if let Some(depends_on) = &self.depends_on {
            map.serialize_entry("DependsOn", depends_on)?;
        }
        map.end()
    }
}
