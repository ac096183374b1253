//! The assembled template IR and its serialized views.

use std::collections::HashSet;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::{TemplateError, TemplateResult};
use crate::output::Output;
use crate::policy::Policy;
use crate::resource::Resource;

/// CloudFormation template format version.
pub const TEMPLATE_VERSION: &str = "2010-09-09";

/// Immutable, deployable template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    format_version: String,
    resources: Vec<Resource>,
    policies: Vec<Policy>,
    outputs: Vec<Output>,
}

impl Template {
    /// Assemble a template, rejecting duplicate logical names and output keys.
    pub fn new(
        resources: Vec<Resource>,
        policies: Vec<Policy>,
        outputs: Vec<Output>,
    ) -> TemplateResult<Self> {
        // rendered names are the keys under `Resources`
        let mut seen = HashSet::new();
        for resource in &resources {
            let rendered = resource.name.rendered();
            if seen.contains(&rendered) {
                return Err(TemplateError::DuplicateResource(rendered));
            }
            seen.insert(rendered);
        }

        let mut keys = HashSet::new();
        for output in &outputs {
            if !keys.insert(output.key.as_str()) {
                return Err(TemplateError::DuplicateOutput(output.key.clone()));
            }
        }

        Ok(Self {
            format_version: TEMPLATE_VERSION.to_string(),
            resources,
            policies,
            outputs,
        })
    }

    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Look up a resource by its rendered logical name.
    pub fn resource(&self, rendered_name: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.name.rendered() == rendered_name)
    }

    pub fn to_value(&self) -> TemplateResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Template body as sent to the API: 2-space indented JSON with a
    /// trailing newline.
    pub fn to_json(&self) -> TemplateResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Human-readable dump.
    pub fn to_yaml(&self) -> TemplateResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

struct Keyed<'a, T>(&'a [T], fn(&T) -> String);

impl<T: Serialize> Serialize for Keyed<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for item in self.0 {
            map.serialize_entry(&(self.1)(item), item)?;
        }
        map.end()
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("AWSTemplateFormatVersion", &self.format_version)?;
        map.serialize_entry(
            "Resources",
            &Keyed(&self.resources, |r: &Resource| r.name.rendered()),
        )?;
        if !self.policies.is_empty() {
            map.serialize_entry("Policies", &self.policies)?;
        }
        if !self.outputs.is_empty() {
            map.serialize_entry("Outputs", &Keyed(&self.outputs, |o: &Output| o.key.clone()))?;
        }
        map.end()
    }
}
