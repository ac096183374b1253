//! Error types for the IAM template factories.

use thiserror::Error;

use cfconfig_template::TemplateError;

/// Result type alias for IAM template operations.
pub type IamResult<T> = Result<T, IamError>;

#[derive(Error, Debug)]
pub enum IamError {
    #[error("No template registered for stack: {0}")]
    UnknownStack(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}
