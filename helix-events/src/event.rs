//! Entity events and the scope they are delivered within.

use chrono::{DateTime, Utc};
use helix_core::{ContextScope, PermissionLevel};
use serde::{Deserialize, Serialize};

/// Where an event happened and what a subscriber must hold to receive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDescriptor {
    pub scope: ContextScope,
    pub scope_instance_id: String,
    pub required_level: PermissionLevel,
}

impl ScopeDescriptor {
    pub fn new(scope: ContextScope, instance_id: impl Into<String>, level: PermissionLevel) -> Self {
        Self {
            scope,
            scope_instance_id: instance_id.into(),
            required_level: level,
        }
    }

    pub fn project(id: impl Into<String>, level: PermissionLevel) -> Self {
        Self::new(ContextScope::Project, id, level)
    }

    pub fn team(id: impl Into<String>, level: PermissionLevel) -> Self {
        Self::new(ContextScope::Team, id, level)
    }

    pub fn organization(id: impl Into<String>, level: PermissionLevel) -> Self {
        Self::new(ContextScope::Organization, id, level)
    }

    pub fn account(id: impl Into<String>, level: PermissionLevel) -> Self {
        Self::new(ContextScope::Account, id, level)
    }

    pub fn node(id: impl Into<String>, level: PermissionLevel) -> Self {
        Self::new(ContextScope::Node, id, level)
    }

    /// Permission names a subscriber needs, e.g. `["READ"]`.
    pub fn required_permissions(&self) -> Vec<&'static str> {
        vec![self.required_level.as_str()]
    }

    /// Whether a subscriber holding `level` here may receive the event.
    pub fn admits(&self, level: PermissionLevel) -> bool {
        level.satisfies(self.required_level)
    }
}

/// One accepted mutation, handed to the fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEvent {
    pub id: String,
    /// `create`, `update` or `remove`.
    pub action: String,
    pub object_type: String,
    pub object_id: String,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub scope: ScopeDescriptor,
}

impl EntityEvent {
    pub fn new(
        action: impl Into<String>,
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        actor_id: impl Into<String>,
        scope: ScopeDescriptor,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action: action.into(),
            object_type: object_type.into(),
            object_id: object_id.into(),
            actor_id: actor_id.into(),
            timestamp: Utc::now(),
            payload: serde_json::Value::Object(Default::default()),
            scope,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// `ticket.created`, `ticket.updated`, `ticket.deleted`.
    pub fn event_type(&self) -> String {
        let verb = match self.action.as_str() {
            "create" => "created",
            "update" | "modify" => "updated",
            "remove" | "delete" => "deleted",
            other => other,
        };
        format!("{}.{}", self.object_type, verb)
    }
}
