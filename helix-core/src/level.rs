//! Permission levels.

use crate::error::InvalidName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability level granted by a permission.
///
/// Levels form a total order `Read < Create < Update < Delete`; holding a
/// level implies every level below it.
///
/// The numeric encoding (`1, 2, 3, 5`) is the one stored in the `permission`
/// table and accepted by the permission-check action. It only matters at the
/// storage boundary, comparisons always go through `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Read,
    Create,
    Update,
    Delete,
}

impl PermissionLevel {
    /// Every level, lowest first.
    pub const ALL: [PermissionLevel; 4] = [
        PermissionLevel::Read,
        PermissionLevel::Create,
        PermissionLevel::Update,
        PermissionLevel::Delete,
    ];

    /// Stored numeric value.
    pub fn value(self) -> i64 {
        match self {
            PermissionLevel::Read => 1,
            PermissionLevel::Create => 2,
            PermissionLevel::Update => 3,
            PermissionLevel::Delete => 5,
        }
    }

    /// Decode a stored numeric value. Values outside `{1, 2, 3, 5}` are rejected.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(PermissionLevel::Read),
            2 => Some(PermissionLevel::Create),
            3 => Some(PermissionLevel::Update),
            5 => Some(PermissionLevel::Delete),
            _ => None,
        }
    }

    /// Whether holding `self` satisfies a check for `required`.
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        self >= required
    }

    /// Upper-case name, as used in event descriptors.
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::Read => "READ",
            PermissionLevel::Create => "CREATE",
            PermissionLevel::Update => "UPDATE",
            PermissionLevel::Delete => "DELETE",
        }
    }

    /// This level and every level it implies, lowest first.
    pub fn implied(self) -> impl Iterator<Item = PermissionLevel> {
        Self::ALL.into_iter().filter(move |l| *l <= self)
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = InvalidName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "READ" => Ok(PermissionLevel::Read),
            "CREATE" => Ok(PermissionLevel::Create),
            "UPDATE" => Ok(PermissionLevel::Update),
            "DELETE" => Ok(PermissionLevel::Delete),
            _ => Err(InvalidName::new("permission level", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(PermissionLevel::Read < PermissionLevel::Create);
        assert!(PermissionLevel::Create < PermissionLevel::Update);
        assert!(PermissionLevel::Update < PermissionLevel::Delete);
    }

    #[test]
    fn test_delete_implies_everything() {
        for level in PermissionLevel::ALL {
            assert!(PermissionLevel::Delete.satisfies(level));
        }
        assert!(!PermissionLevel::Read.satisfies(PermissionLevel::Update));
    }

    #[test]
    fn test_value_encoding() {
        for level in PermissionLevel::ALL {
            assert_eq!(PermissionLevel::from_value(level.value()), Some(level));
        }
        assert_eq!(PermissionLevel::from_value(4), None);
        assert_eq!(PermissionLevel::from_value(0), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("update".parse::<PermissionLevel>().unwrap(), PermissionLevel::Update);
        assert!("write".parse::<PermissionLevel>().is_err());
    }

    #[test]
    fn test_implied_levels() {
        let implied: Vec<_> = PermissionLevel::Create.implied().collect();
        assert_eq!(implied, vec![PermissionLevel::Read, PermissionLevel::Create]);
    }
}
