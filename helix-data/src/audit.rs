//! Append-only audit records.

use crate::diff::ChangeSet;
use crate::record::Fields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Remove,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Remove => "remove",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(AuditAction::Create),
            "update" => Some(AuditAction::Update),
            "remove" => Some(AuditAction::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted write. `version` is the version the write produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub version: u64,
    pub action: AuditAction,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
    /// `None` for a create.
    pub before: Option<Fields>,
    /// `None` for a remove.
    pub after: Option<Fields>,
    pub changes: ChangeSet,
    pub summary: String,
}

impl AuditRecord {
    pub(crate) fn new(
        entity_type: &str,
        entity_id: &str,
        version: u64,
        action: AuditAction,
        actor_id: &str,
        before: Option<Fields>,
        after: Option<Fields>,
    ) -> Self {
        let changes = match (&before, &after) {
            (Some(before), Some(after)) => ChangeSet::between(before, after),
            (None, Some(after)) => ChangeSet::created(after),
            _ => ChangeSet::default(),
        };
        let summary = summarize(action, &changes);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            version,
            action,
            actor_id: actor_id.to_string(),
            timestamp: Utc::now(),
            before,
            after,
            changes,
            summary,
        }
    }
}

fn summarize(action: AuditAction, changes: &ChangeSet) -> String {
    match action {
        AuditAction::Create => "Entity created".to_string(),
        AuditAction::Remove => "Entity deleted".to_string(),
        AuditAction::Update => match changes.describe() {
            Some(list) => format!("Entity updated: {list}"),
            None => "Entity updated (no field changes detected)".to_string(),
        },
    }
}
