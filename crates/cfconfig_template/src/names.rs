//! Logical names and intrinsic references.

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{json, Value};

/// Template-local identifier of a resource or policy, scoped to an
/// environment.
///
/// Several environments share one AWS account, so every logical name is
/// qualified by its environment. The rendered form is the concatenation
/// `environment + name`, e.g. `devBuildRole`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalName {
    environment: String,
    name: String,
}

impl LogicalName {
    pub fn new(environment: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            name: name.into(),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The un-prefixed name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as it appears in the rendered template.
    pub fn rendered(&self) -> String {
        format!("{}{}", self.environment, self.name)
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.environment, self.name)
    }
}

impl Serialize for LogicalName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// CloudFormation intrinsic function used as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intrinsic {
    /// `{"Ref": target}`
    Ref(String),
    /// `{"Fn::GetAtt": [resource, attribute]}`
    GetAtt { resource: String, attribute: String },
}

impl Intrinsic {
    /// Reference a raw identifier such as a pseudo parameter (`AWS::AccountId`).
    pub fn reference(target: impl Into<String>) -> Self {
        Self::Ref(target.into())
    }

    pub fn get_att(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Ref(target) => json!({ "Ref": target }),
            Self::GetAtt {
                resource,
                attribute,
            } => json!({ "Fn::GetAtt": [resource, attribute] }),
        }
    }
}

impl Serialize for Intrinsic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Ref(target) => map.serialize_entry("Ref", target)?,
            Self::GetAtt {
                resource,
                attribute,
            } => map.serialize_entry("Fn::GetAtt", &[resource, attribute])?,
        }
        map.end()
    }
}

impl From<Intrinsic> for Value {
    fn from(intrinsic: Intrinsic) -> Self {
        intrinsic.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_name_rendering() {
        let name = LogicalName::new("dev", "BuildRole");
        assert_eq!(name.rendered(), "devBuildRole");
        assert_eq!(name.to_string(), "devBuildRole");
        assert_eq!(name.name(), "BuildRole");
    }

    #[test]
    fn test_composite_key_equality() {
        assert_ne!(
            LogicalName::new("dev", "Role"),
            LogicalName::new("de", "vRole")
        );
    }

    #[test]
    fn test_intrinsic_json() {
        let att = Intrinsic::get_att("devBuildRole", "Arn");
        assert_eq!(
            serde_json::to_value(&att).unwrap(),
            json!({"Fn::GetAtt": ["devBuildRole", "Arn"]})
        );
        assert_eq!(att.to_value(), serde_json::to_value(&att).unwrap());
        assert_eq!(
            Intrinsic::reference("AWS::AccountId").to_value(),
            json!({"Ref": "AWS::AccountId"})
        );
    }
}
