//! Named policies and policy documents.

use serde::Serialize;

use crate::names::LogicalName;
use crate::statement::Statement;

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Versioned statement list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<Statement>,
}

impl PolicyDocument {
    /// Flatten statement lists into one document.
    pub fn new<I>(statements: I) -> Self
    where
        I: IntoIterator<Item = Vec<Statement>>,
    {
        Self {
            version: POLICY_VERSION.to_string(),
            statements: statements.into_iter().flatten().collect(),
        }
    }
}

/// Named policy, attached inline to a resource or kept standalone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Policy {
    #[serde(rename = "PolicyName")]
    pub name: LogicalName,
    #[serde(rename = "PolicyDocument")]
    pub document: PolicyDocument,
}

impl Policy {
    pub fn new(name: LogicalName, document: PolicyDocument) -> Self {
        Self { name, document }
    }
}
