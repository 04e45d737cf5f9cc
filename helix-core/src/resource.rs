//! Resource types and the scope each one is authorized against.

use crate::error::InvalidName;
use crate::scope::ContextScope;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The kinds of object the tracker authorizes access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Node,
    Account,
    Organization,
    Team,
    Project,
    Ticket,
    Board,
    Dashboard,
    Filter,
    Version,
    Epic,
    Component,
    Comment,
    Cycle,
    Label,
    Worklog,
}

impl ResourceType {
    pub const ALL: [ResourceType; 16] = [
        ResourceType::Node,
        ResourceType::Account,
        ResourceType::Organization,
        ResourceType::Team,
        ResourceType::Project,
        ResourceType::Ticket,
        ResourceType::Board,
        ResourceType::Dashboard,
        ResourceType::Filter,
        ResourceType::Version,
        ResourceType::Epic,
        ResourceType::Component,
        ResourceType::Comment,
        ResourceType::Cycle,
        ResourceType::Label,
        ResourceType::Worklog,
    ];

    /// The scope whose context instance a check for this resource names.
    pub fn scope(self) -> ContextScope {
        match self {
            ResourceType::Node => ContextScope::Node,
            ResourceType::Account | ResourceType::Dashboard | ResourceType::Filter => {
                ContextScope::Account
            }
            ResourceType::Organization => ContextScope::Organization,
            ResourceType::Team => ContextScope::Team,
            ResourceType::Project
            | ResourceType::Ticket
            | ResourceType::Board
            | ResourceType::Version
            | ResourceType::Epic
            | ResourceType::Component
            | ResourceType::Comment
            | ResourceType::Cycle
            | ResourceType::Label
            | ResourceType::Worklog => ContextScope::Project,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Node => "node",
            ResourceType::Account => "account",
            ResourceType::Organization => "organization",
            ResourceType::Team => "team",
            ResourceType::Project => "project",
            ResourceType::Ticket => "ticket",
            ResourceType::Board => "board",
            ResourceType::Dashboard => "dashboard",
            ResourceType::Filter => "filter",
            ResourceType::Version => "version",
            ResourceType::Epic => "epic",
            ResourceType::Component => "component",
            ResourceType::Comment => "comment",
            ResourceType::Cycle => "cycle",
            ResourceType::Label => "label",
            ResourceType::Worklog => "worklog",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = InvalidName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidName::new("resource type", s))
    }
}

/// Lookup table from resource-type name to scope.
///
/// Seeded with every [`ResourceType`]; deployments can register extra names
/// (see `access.resources` in the configuration). A name that is not in the
/// table has no scope, and checks against it are denied.
#[derive(Debug, Clone)]
pub struct ResourceScopes {
    scopes: HashMap<String, ContextScope>,
}

impl ResourceScopes {
    /// Table containing the built-in resource types.
    pub fn new() -> Self {
        let scopes = ResourceType::ALL
            .into_iter()
            .map(|r| (r.as_str().to_string(), r.scope()))
            .collect();
        Self { scopes }
    }

    /// Register (or re-map) a resource type name.
    pub fn with(mut self, resource_type: impl Into<String>, scope: ContextScope) -> Self {
        self.insert(resource_type, scope);
        self
    }

    pub fn insert(&mut self, resource_type: impl Into<String>, scope: ContextScope) {
        self.scopes
            .insert(resource_type.into().to_ascii_lowercase(), scope);
    }

    /// Scope for `resource_type`, `None` if the name is unknown.
    pub fn scope_of(&self, resource_type: &str) -> Option<ContextScope> {
        self.scopes
            .get(&resource_type.to_ascii_lowercase())
            .copied()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ResourceScopes {
    fn default() -> Self {
        Self::new()
    }
}
