//! Error types for template construction.

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while building a template.
///
/// These are caller errors: they are reported before anything reaches the
/// remote API.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Statement requires at least one action")]
    EmptyActions,

    #[error("Statement for {0} has no resources and no principal or condition clause")]
    MissingResources(String),

    #[error("Deny-other statement for {0} requires explicit resources")]
    DenyWithoutResources(String),

    #[error("Duplicate resource logical name: {0}")]
    DuplicateResource(String),

    #[error("Duplicate output key: {0}")]
    DuplicateOutput(String),

    #[error("Invalid property {property} on {resource}: {message}")]
    InvalidProperty {
        resource: String,
        property: String,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
