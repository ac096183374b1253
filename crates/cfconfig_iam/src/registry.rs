//! Stack name to template factory lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use cfconfig_template::{StackTemplate, TagSet, Template, TemplateBuilder, TemplateResult, TemplateSource};

use crate::build_system::{build_system_tags, BuildSystemTemplate, STACK_NAME};
use crate::error::{IamError, IamResult};

/// A registered template source and the tags its stack carries.
#[derive(Clone)]
pub struct RegisteredTemplate {
    source: Arc<dyn TemplateSource>,
    tags: TagSet,
}

impl RegisteredTemplate {
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

impl std::fmt::Debug for RegisteredTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTemplate")
            .field("source", &self.source.name())
            .field("tags", &self.tags)
            .finish()
    }
}

struct SharedSource(Arc<dyn TemplateSource>);

impl TemplateSource for SharedSource {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn construct(&self, builder: &TemplateBuilder) -> TemplateResult<Template> {
        self.0.construct(builder)
    }
}

/// Templates known by stack name.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, RegisteredTemplate>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Registry with the built-in templates.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(STACK_NAME, BuildSystemTemplate::new(), build_system_tags());
        registry
    }

    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        stack_name: impl Into<String>,
        source: impl TemplateSource + 'static,
        tags: TagSet,
    ) {
        let stack_name = stack_name.into();
        debug!("Registering template {} for stack {}", source.name(), stack_name);
        self.templates.insert(
            stack_name,
            RegisteredTemplate {
                source: Arc::new(source),
                tags,
            },
        );
    }

    pub fn get(&self, stack_name: &str) -> Option<&RegisteredTemplate> {
        self.templates.get(stack_name)
    }

    pub fn contains(&self, stack_name: &str) -> bool {
        self.templates.contains_key(stack_name)
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// A fresh, unbuilt template for `stack_name` in `environment`.
    pub fn template_for(&self, stack_name: &str, environment: &str) -> IamResult<StackTemplate> {
        let entry = self
            .get(stack_name)
            .ok_or_else(|| IamError::UnknownStack(stack_name.to_string()))?;

        let builder = TemplateBuilder::new(environment).with_tags(entry.tags.clone());
        Ok(StackTemplate::new(builder, SharedSource(entry.source.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_registered_by_default() {
        let registry = TemplateRegistry::new();
        assert_eq!(registry.stack_names(), vec![STACK_NAME]);
        assert_eq!(registry.get(STACK_NAME).unwrap().tags().get("System"), Some("config-build"));
    }

    #[test]
    fn test_unknown_stack() {
        let registry = TemplateRegistry::empty();
        assert!(matches!(
            registry.template_for("app", "dev"),
            Err(IamError::UnknownStack(name)) if name == "app"
        ));
    }

    #[test]
    fn test_template_for_environment() {
        let registry = TemplateRegistry::new();
        let mut template = registry.template_for(STACK_NAME, "test").unwrap();
        assert!(!template.is_built());

        let json = template.to_json().unwrap();
        assert!(json.contains("\"testCFconfigBuildRole\""));
        assert_eq!(template.builder().tags().get("Component"), Some("config-deploy"));
    }
}
