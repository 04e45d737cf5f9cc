//! Field-by-field comparison of two snapshots.

use crate::record::Fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldChange {
    Added { field: String, value: Value },
    Changed { field: String, from: Value, to: Value },
    Removed { field: String, value: Value },
}

impl FieldChange {
    pub fn field(&self) -> &str {
        match self {
            FieldChange::Added { field, .. }
            | FieldChange::Changed { field, .. }
            | FieldChange::Removed { field, .. } => field,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            FieldChange::Added { .. } => "added",
            FieldChange::Changed { .. } => "changed",
            FieldChange::Removed { .. } => "removed",
        }
    }
}

/// Every field that differs between two snapshots, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(pub Vec<FieldChange>);

impl ChangeSet {
    pub fn between(before: &Fields, after: &Fields) -> Self {
        let mut changes = Vec::new();
        for (field, old) in before {
            match after.get(field) {
                Some(new) if new != old => changes.push(FieldChange::Changed {
                    field: field.clone(),
                    from: old.clone(),
                    to: new.clone(),
                }),
                Some(_) => {}
                None => changes.push(FieldChange::Removed {
                    field: field.clone(),
                    value: old.clone(),
                }),
            }
        }
        for (field, new) in after {
            if !before.contains_key(field) {
                changes.push(FieldChange::Added {
                    field: field.clone(),
                    value: new.clone(),
                });
            }
        }
        changes.sort_by(|a, b| a.field().cmp(b.field()));
        ChangeSet(changes)
    }

    /// Everything in `fields`, reported as added.
    pub fn created(fields: &Fields) -> Self {
        Self::between(&Fields::new(), fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.0.iter()
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.iter().find(|c| c.field() == field)
    }

    /// `title changed, due added, tag removed`, or `None` when nothing changed.
    pub fn describe(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(|c| format!("{} {}", c.field(), c.verb()))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Merge `patch` into `fields`. A JSON `null` removes the field.
pub fn apply_patch(fields: &mut Fields, patch: Fields) {
    for (field, value) in patch {
        if value.is_null() {
            fields.remove(&field);
        } else {
            fields.insert(field, value);
        }
    }
}
