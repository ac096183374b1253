//! Error types for stack operations.

use thiserror::Error;

use cfconfig_template::TemplateError;

/// Result type alias for stack operations.
pub type StackResult<T> = Result<T, StackError>;

/// Errors that can occur while deploying or inspecting a stack.
#[derive(Error, Debug)]
pub enum StackError {
    /// The remote API rejected a call. The message is passed through as-is.
    #[error("{message}")]
    Api { operation: String, message: String },

    #[error("Role assumption failed for {role}: {message}")]
    AssumeRole { role: String, message: String },

    #[error("AWS CLI not available: {0}")]
    CliNotAvailable(String),

    #[error("Unexpected response from {operation}: {message}")]
    InvalidResponse { operation: String, message: String },

    #[error("No template attached to stack {0}")]
    MissingTemplate(String),

    #[error("Timed out after {seconds} seconds waiting for stack {stack}")]
    WaitTimeout { stack: String, seconds: u64 },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
