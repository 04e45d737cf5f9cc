use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field snapshot of an entity. Ordered, so diffs come out in lexical order.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Current state of a versioned entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    /// Starts at 1 and moves up by exactly one per accepted write.
    pub version: u64,
    pub deleted: bool,
    pub fields: Fields,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            version: 1,
            deleted: false,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}
