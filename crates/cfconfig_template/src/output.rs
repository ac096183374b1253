//! Template outputs.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::names::Intrinsic;

/// Attribute fetched when none is given.
pub const DEFAULT_ATTRIBUTE: &str = "Arn";

/// Value of an exported output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    /// A static value.
    Literal(Value),
    /// A `Ref` to a resource or parameter.
    Ref(String),
    /// A `Fn::GetAtt` on a resource.
    GetAtt { resource: String, attribute: String },
}

impl OutputValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Fetch the default `Arn` attribute of a resource.
    pub fn arn(resource: impl Into<String>) -> Self {
        Self::GetAtt {
            resource: resource.into(),
            attribute: DEFAULT_ATTRIBUTE.to_string(),
        }
    }
}

impl From<Intrinsic> for OutputValue {
    fn from(intrinsic: Intrinsic) -> Self {
        match intrinsic {
            Intrinsic::Ref(target) => Self::Ref(target),
            Intrinsic::GetAtt {
                resource,
                attribute,
            } => Self::GetAtt {
                resource,
                attribute,
            },
        }
    }
}

impl From<&str> for OutputValue {
    fn from(value: &str) -> Self {
        Self::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for OutputValue {
    fn from(value: String) -> Self {
        Self::Literal(Value::String(value))
    }
}

impl Serialize for OutputValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutputValue::Literal(value) => value.serialize(serializer),
            OutputValue::Ref(target) => Intrinsic::Ref(target.clone()).serialize(serializer),
            OutputValue::GetAtt {
                resource,
                attribute,
            } => Intrinsic::get_att(resource.clone(), attribute.clone()).serialize(serializer),
        }
    }
}

/// Exported template value.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub key: String,
    pub value: OutputValue,
    /// Account-wide export name for cross-stack references.
    pub export_name: Option<String>,
}

impl Output {
    pub fn new(key: impl Into<String>, value: impl Into<OutputValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            export_name: None,
        }
    }

    pub fn with_export(mut self, name: impl Into<String>) -> Self {
        self.export_name = Some(name.into());
        self
    }
}

/// Serializes the output body; the key is the map key in the template.
impl Serialize for Output {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Value", &self.value)?;
        if let Some(export) = &self.export_name {
            map.serialize_entry("Export", &serde_json::json!({ "Name": export }))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_value_forms() {
        assert_eq!(
            serde_json::to_value(Output::new("GroupName", "devConfigDeployGroup")).unwrap(),
            json!({"Value": "devConfigDeployGroup"})
        );
        assert_eq!(
            serde_json::to_value(Output::new("RoleArn", OutputValue::arn("devBuildRole"))).unwrap(),
            json!({"Value": {"Fn::GetAtt": ["devBuildRole", "Arn"]}})
        );
        assert_eq!(
            serde_json::to_value(Output::new("AccessId", OutputValue::Ref("devKey".into()))).unwrap(),
            json!({"Value": {"Ref": "devKey"}})
        );
    }

    #[test]
    fn test_export_name() {
        let output = Output::new("RoleArn", OutputValue::arn("devBuildRole"))
            .with_export("dev-build-role-arn");
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["Export"], json!({"Name": "dev-build-role-arn"}));
    }
}
