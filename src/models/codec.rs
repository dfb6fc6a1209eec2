//! Serde adapters for list-valued cells.
//!
//! The store has no array column type for plain text, so id lists are kept
//! as comma-joined strings and quest ids as a JSON-encoded string. Both
//! adapters also accept a real JSON array (linked-record cells).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

fn strings_from_array(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Comma-joined id list, e.g. `"recA,recB"`
pub mod comma_list {
    use super::*;

    pub fn serialize<S: Serializer>(ids: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&join(ids))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(split(&s)),
            Some(Value::Array(items)) => Ok(strings_from_array(items)),
            Some(other) => Err(D::Error::custom(format!("expected id list, got {}", other))),
        }
    }

    pub fn split(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn join(ids: &[String]) -> String {
        ids.join(",")
    }
}

/// JSON-encoded string list, e.g. `"[\"streak-3\"]"`
pub mod json_list {
    use super::*;

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(items))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            // Hand-edited cells are common; an unparseable list counts as empty
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(serde_json::from_str(&s).unwrap_or_default()),
            Some(Value::Array(items)) => Ok(strings_from_array(items)),
            Some(other) => Err(D::Error::custom(format!("expected JSON list, got {}", other))),
        }
    }

    pub fn encode(items: &[String]) -> String {
        serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
    }
}
