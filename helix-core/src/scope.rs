//! The fixed authorization scope taxonomy.

use crate::error::InvalidName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One level of the containment hierarchy `Node ⊃ Account ⊃ Organization ⊃ Team ⊃ Project`.
///
/// The hierarchy is closed. Traversals iterate over [`ContextScope::HIERARCHY`]
/// rather than dispatching on anything dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextScope {
    Node,
    Account,
    Organization,
    Team,
    Project,
}

impl ContextScope {
    /// Every scope, broadest first.
    pub const HIERARCHY: [ContextScope; 5] = [
        ContextScope::Node,
        ContextScope::Account,
        ContextScope::Organization,
        ContextScope::Team,
        ContextScope::Project,
    ];

    /// Position in [`Self::HIERARCHY`]; `0` is the broadest.
    pub fn depth(self) -> usize {
        match self {
            ContextScope::Node => 0,
            ContextScope::Account => 1,
            ContextScope::Organization => 2,
            ContextScope::Team => 3,
            ContextScope::Project => 4,
        }
    }

    /// The next broader scope, `None` for [`ContextScope::Node`].
    pub fn parent(self) -> Option<ContextScope> {
        self.depth()
            .checked_sub(1)
            .map(|d| Self::HIERARCHY[d])
    }

    /// Whether `self` sits strictly above `other`.
    pub fn is_broader_than(self, other: ContextScope) -> bool {
        self.depth() < other.depth()
    }

    /// `self` followed by every broader scope, narrowest first.
    ///
    /// This is the order the authorization walk visits scopes in.
    pub fn upward(self) -> impl Iterator<Item = ContextScope> {
        Self::HIERARCHY.into_iter().take(self.depth() + 1).rev()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextScope::Node => "node",
            ContextScope::Account => "account",
            ContextScope::Organization => "organization",
            ContextScope::Team => "team",
            ContextScope::Project => "project",
        }
    }
}

impl fmt::Display for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextScope {
    type Err = InvalidName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::HIERARCHY
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidName::new("context scope", s))
    }
}
