//! IAM policy statements and deny-pairing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TemplateError, TemplateResult};
use crate::names::Intrinsic;

/// Extra statement keys that stand in for an explicit resource list.
const RESOURCE_SUBSTITUTES: [&str; 3] = ["Principal", "NotPrincipal", "Condition"];

/// Statement effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered action identifiers. A single action converts to a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionList(Vec<String>);

impl ActionList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for ActionList {
    fn from(action: &str) -> Self {
        Self(vec![action.to_string()])
    }
}

impl From<String> for ActionList {
    fn from(action: String) -> Self {
        Self(vec![action])
    }
}

impl From<Vec<String>> for ActionList {
    fn from(actions: Vec<String>) -> Self {
        Self(actions)
    }
}

impl From<Vec<&str>> for ActionList {
    fn from(actions: Vec<&str>) -> Self {
        Self(actions.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ActionList {
    fn from(actions: [&str; N]) -> Self {
        Self(actions.into_iter().map(String::from).collect())
    }
}

/// Ordered resource identifiers: ARNs, the `*` wildcard or intrinsic
/// references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceList(Vec<Value>);

impl ResourceList {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<&str> for ResourceList {
    fn from(resource: &str) -> Self {
        Self(vec![Value::String(resource.to_string())])
    }
}

impl From<String> for ResourceList {
    fn from(resource: String) -> Self {
        Self(vec![Value::String(resource)])
    }
}

impl From<Intrinsic> for ResourceList {
    fn from(resource: Intrinsic) -> Self {
        Self(vec![resource.to_value()])
    }
}

impl From<Vec<&str>> for ResourceList {
    fn from(resources: Vec<&str>) -> Self {
        Self(resources.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for ResourceList {
    fn from(resources: Vec<String>) -> Self {
        Self(resources.into_iter().map(Value::String).collect())
    }
}

impl From<Vec<Value>> for ResourceList {
    fn from(resources: Vec<Value>) -> Self {
        Self(resources)
    }
}

impl From<Vec<Intrinsic>> for ResourceList {
    fn from(resources: Vec<Intrinsic>) -> Self {
        Self(resources.iter().map(Intrinsic::to_value).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ResourceList {
    fn from(resources: [&str; N]) -> Self {
        Self(resources.into_iter().map(Value::from).collect())
    }
}

/// One authorization rule inside a policy document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource", skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Value>,
    #[serde(rename = "NotResource", skip_serializing_if = "Vec::is_empty")]
    pub not_resources: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Builder for one statement, or an allow/deny pair.
///
/// ```
/// use cfconfig_template::StatementBuilder;
///
/// let statements = StatementBuilder::allow("s3:GetObject")
///     .on("arn:aws:s3:::bucket/*")
///     .deny_other()
///     .build()
///     .unwrap();
/// assert_eq!(statements.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    effect: Effect,
    actions: ActionList,
    resources: ResourceList,
    deny_other: bool,
    extra: Map<String, Value>,
}

impl StatementBuilder {
    pub fn new(effect: Effect, actions: impl Into<ActionList>) -> Self {
        Self {
            effect,
            actions: actions.into(),
            resources: ResourceList::none(),
            deny_other: false,
            extra: Map::new(),
        }
    }

    pub fn allow(actions: impl Into<ActionList>) -> Self {
        Self::new(Effect::Allow, actions)
    }

    pub fn deny(actions: impl Into<ActionList>) -> Self {
        Self::new(Effect::Deny, actions)
    }

    pub fn on(mut self, resources: impl Into<ResourceList>) -> Self {
        self.resources = resources.into();
        self
    }

    /// Also deny the same actions on every resource not listed.
    pub fn deny_other(mut self) -> Self {
        self.deny_other = true;
        self
    }

    /// Set deny pairing from a flag.
    pub fn with_deny_other(mut self, deny_other: bool) -> Self {
        self.deny_other = deny_other;
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn principal(self, principal: impl Into<Value>) -> Self {
        self.extra("Principal", principal)
    }

    pub fn condition(self, condition: impl Into<Value>) -> Self {
        self.extra("Condition", condition)
    }

    /// Produce the statement list.
    ///
    /// Yields one statement, or two when deny pairing is requested: the
    /// statement itself followed by a `Deny` on the same actions with
    /// `NotResource` set to the original resources.
    pub fn build(self) -> TemplateResult<Vec<Statement>> {
        if self.actions.is_empty() {
            return Err(TemplateError::EmptyActions);
        }

        let actions = self.actions.into_vec();
        let label = actions.join(",");

        if self.resources.is_empty() {
            if self.deny_other {
                return Err(TemplateError::DenyWithoutResources(label));
            }
            if !RESOURCE_SUBSTITUTES
                .iter()
                .any(|key| self.extra.contains_key(*key))
            {
                return Err(TemplateError::MissingResources(label));
            }
        }

        let resources = self.resources.into_vec();

        let statement = Statement {
            effect: self.effect,
            actions: actions.clone(),
            resources: resources.clone(),
            not_resources: Vec::new(),
            extra: self.extra,
        };

        let mut constructed = vec![statement];

        if self.deny_other {
            constructed.push(Statement {
                effect: Effect::Deny,
                actions,
                resources: Vec::new(),
                not_resources: resources,
                extra: Map::new(),
            });
        }

        Ok(constructed)
    }
}

/// Build a statement list from positional arguments.
pub fn build_statement(
    actions: impl Into<ActionList>,
    resources: impl Into<ResourceList>,
    effect: Effect,
    deny_other: bool,
    extra: Map<String, Value>,
) -> TemplateResult<Vec<Statement>> {
    let mut builder = StatementBuilder::new(effect, actions)
        .on(resources)
        .with_deny_other(deny_other);
    builder.extra = extra;
    builder.build()
}
