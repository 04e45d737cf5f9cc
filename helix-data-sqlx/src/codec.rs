//! Column encodings shared by the stores.
//!
//! SQLite has no native unsigned, JSON or timestamp columns: versions are
//! `INTEGER`, maps are JSON `TEXT` and timestamps RFC 3339 `TEXT`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) fn version_to_db(version: u64) -> Result<i64, String> {
    i64::try_from(version).map_err(|_| format!("version {version} out of range"))
}

pub(crate) fn version_from_db(value: i64) -> Result<u64, String> {
    u64::try_from(value).map_err(|_| format!("negative version {value}"))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

pub(crate) fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    serde_json::from_str(text).map_err(|e| e.to_string())
}

pub(crate) fn timestamp_to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn timestamp_from_db(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {text:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_bounds() {
        assert_eq!(version_to_db(7).unwrap(), 7);
        assert!(version_to_db(u64::MAX).is_err());
        assert!(version_from_db(-1).is_err());
    }

    #[test]
    fn test_timestamp_keeps_precision() {
        let now = Utc::now();
        assert_eq!(timestamp_from_db(&timestamp_to_db(&now)).unwrap(), now);
        assert!(timestamp_from_db("yesterday").is_err());
    }
}
