//! Projection of stack events onto selected attributes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::StackEvent;
use crate::status::{terminal_statuses, StatusClass};

/// Event attribute that can be projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAttribute {
    LogicalResourceId,
    ResourceStatus,
    ResourceStatusReason,
    StackId,
    Timestamp,
    ResourceType,
    PhysicalResourceId,
}

impl EventAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAttribute::LogicalResourceId => "logical_resource_id",
            EventAttribute::ResourceStatus => "resource_status",
            EventAttribute::ResourceStatusReason => "resource_status_reason",
            EventAttribute::StackId => "stack_id",
            EventAttribute::Timestamp => "timestamp",
            EventAttribute::ResourceType => "resource_type",
            EventAttribute::PhysicalResourceId => "physical_resource_id",
        }
    }

    /// Attributes shown by `status`, `failure`, `success` and `finished`.
    pub fn standard() -> Vec<Self> {
        vec![
            EventAttribute::LogicalResourceId,
            EventAttribute::ResourceStatus,
            EventAttribute::ResourceStatusReason,
            EventAttribute::StackId,
            EventAttribute::Timestamp,
        ]
    }

    pub fn all() -> Vec<Self> {
        let mut all = Self::standard();
        all.push(EventAttribute::ResourceType);
        all.push(EventAttribute::PhysicalResourceId);
        all
    }

    fn value_of(&self, event: &StackEvent) -> Value {
        let optional = |v: &Option<String>| v.clone().map(Value::String).unwrap_or(Value::Null);
        match self {
            EventAttribute::LogicalResourceId => optional(&event.logical_resource_id),
            EventAttribute::ResourceStatus => optional(&event.resource_status),
            EventAttribute::ResourceStatusReason => optional(&event.resource_status_reason),
            EventAttribute::StackId => Value::String(event.stack_id.clone()),
            EventAttribute::Timestamp => Value::String(event.timestamp.to_rfc3339()),
            EventAttribute::ResourceType => optional(&event.resource_type),
            EventAttribute::PhysicalResourceId => optional(&event.physical_resource_id),
        }
    }
}

impl std::fmt::Display for EventAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event reduced to the requested attributes, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventRecord(Map<String, Value>);

impl EventRecord {
    pub fn project(event: &StackEvent, attributes: &[EventAttribute]) -> Self {
        let mut map = Map::new();
        for attribute in attributes {
            map.insert(attribute.as_str().to_string(), attribute.value_of(event));
        }
        Self(map)
    }

    pub fn get(&self, attribute: EventAttribute) -> Option<&Value> {
        self.0.get(attribute.as_str())
    }

    pub fn status(&self) -> Option<&str> {
        self.get(EventAttribute::ResourceStatus)
            .and_then(Value::as_str)
    }

    pub fn reason(&self) -> Option<&str> {
        self.get(EventAttribute::ResourceStatusReason)
            .and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Which events to fetch and how to project them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub attributes: Vec<EventAttribute>,
    /// Keep only events whose status is in this set. `None` keeps all.
    pub statuses: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self::standard()
    }
}

impl EventQuery {
    pub fn standard() -> Self {
        Self {
            attributes: EventAttribute::standard(),
            statuses: None,
            limit: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<EventAttribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_statuses(mut self, statuses: &[&str]) -> Self {
        self.statuses = Some(statuses.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_class(self, class: StatusClass) -> Self {
        self.with_statuses(class.statuses())
    }

    pub fn terminal(self) -> Self {
        self.with_statuses(&terminal_statuses())
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, event: &StackEvent) -> bool {
        match &self.statuses {
            None => true,
            Some(statuses) => event
                .status()
                .map(|s| statuses.iter().any(|allowed| allowed == s))
                .unwrap_or(false),
        }
    }

    /// Filter, order and project a batch of events.
    ///
    /// Records are ordered newest first only when the timestamp is one of
    /// the projected attributes; otherwise the API order is kept.
    pub fn apply(&self, events: &[StackEvent]) -> Vec<EventRecord> {
        let mut selected: Vec<&StackEvent> = events.iter().filter(|e| self.matches(e)).collect();
        if self.attributes.contains(&EventAttribute::Timestamp) {
            selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
            .into_iter()
            .map(|e| EventRecord::project(e, &self.attributes))
            .collect()
    }
}
