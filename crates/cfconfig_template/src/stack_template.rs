//! Construct-once template wrapper.

use serde_json::Value;
use tracing::info;

use crate::builder::TemplateBuilder;
use crate::error::TemplateResult;
use crate::template::Template;

/// Something that knows how to assemble a template.
pub trait TemplateSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "template"
    }

    fn construct(&self, builder: &TemplateBuilder) -> TemplateResult<Template>;
}

impl<F> TemplateSource for F
where
    F: Fn(&TemplateBuilder) -> TemplateResult<Template> + Send + Sync,
{
    fn construct(&self, builder: &TemplateBuilder) -> TemplateResult<Template> {
        self(builder)
    }
}

/// Construction state of a [`StackTemplate`].
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateState {
    Unbuilt,
    Built(Template),
}

/// A template source bound to a builder, constructed at most once.
///
/// The first view (`template`, `to_json`, `to_value`, `to_yaml`) runs
/// `construct()`; later views reuse the cached IR.
pub struct StackTemplate {
    builder: TemplateBuilder,
    source: Box<dyn TemplateSource>,
    state: TemplateState,
}

impl StackTemplate {
    pub fn new(builder: TemplateBuilder, source: impl TemplateSource + 'static) -> Self {
        Self {
            builder,
            source: Box::new(source),
            state: TemplateState::Unbuilt,
        }
    }

    pub fn builder(&self) -> &TemplateBuilder {
        &self.builder
    }

    pub fn state(&self) -> &TemplateState {
        &self.state
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, TemplateState::Built(_))
    }

    /// The built template, constructing it on first use.
    pub fn template(&mut self) -> TemplateResult<&Template> {
        if let TemplateState::Unbuilt = self.state {
            info!(
                "Constructing {} for environment {}",
                self.source.name(),
                self.builder.environment()
            );
            let template = self.source.construct(&self.builder)?;
            self.state = TemplateState::Built(template);
        }

        match &self.state {
            TemplateState::Built(template) => Ok(template),
            TemplateState::Unbuilt => unreachable!("template constructed above"),
        }
    }

    pub fn to_json(&mut self) -> TemplateResult<String> {
        self.template()?.to_json()
    }

    pub fn to_value(&mut self) -> TemplateResult<Value> {
        self.template()?.to_value()
    }

    pub fn to_yaml(&mut self) -> TemplateResult<String> {
        self.template()?.to_yaml()
    }
}

impl std::fmt::Debug for StackTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackTemplate")
            .field("source", &self.source.name())
            .field("environment", &self.builder.environment())
            .field("built", &self.is_built())
            .finish()
    }
}
