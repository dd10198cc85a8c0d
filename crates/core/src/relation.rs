//! Decoding of loosely-typed remote field values.
//!
//! The remote system returns a many-to-one field as `[id, "label"]` (or
//! `false` when empty) and a one-to-many / many-to-many field as a bare id
//! list. Empty text fields come back as `false` instead of `""`. These
//! helpers turn such values into typed Rust values right after an RPC call
//! returns; the `deserialize_*` functions plug into
//! `#[serde(deserialize_with = "...")]`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{is_persisted_id, RecordId};

/// A resolved reference to a single remote record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Many2One {
    pub id: RecordId,
    pub label: String,
}

/// Decode a many-to-one value. `false` and `null` decode to `None`.
///
/// A bare positive integer is accepted as an unlabeled reference.
pub fn decode_many2one(value: &Value) -> Result<Option<Many2One>, CoreError> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(id) if is_persisted_id(id) => Ok(Some(Many2One {
                id,
                label: String::new(),
            })),
            _ => Err(CoreError::Malformed(format!("invalid reference id: {n}"))),
        },
        Value::Array(pair) => match pair.as_slice() {
            [Value::Number(n), label] => {
                let id = n
                    .as_i64()
                    .filter(|id| is_persisted_id(*id))
                    .ok_or_else(|| CoreError::Malformed(format!("invalid reference id: {n}")))?;
                let label = label.as_str().unwrap_or_default().to_string();
                Ok(Some(Many2One { id, label }))
            }
            _ => Err(CoreError::Malformed(format!(
                "expected [id, label] pair, got {value}"
            ))),
        },
        other => Err(CoreError::Malformed(format!(
            "unexpected many-to-one value: {other}"
        ))),
    }
}

/// Decode a one-to-many or many-to-many id list. `false` and `null` decode
/// to an empty list.
pub fn decode_id_list(value: &Value) -> Result<Vec<RecordId>, CoreError> {
    match value {
        Value::Null | Value::Bool(false) => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .filter(|id| is_persisted_id(*id))
                    .ok_or_else(|| CoreError::Malformed(format!("invalid id in list: {item}")))
            })
            .collect(),
        other => Err(CoreError::Malformed(format!("expected id list, got {other}"))),
    }
}

/// Decode a text field, mapping `false`, `null` and `""` to `None`.
pub fn decode_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

// ---- serde adapters ----

pub fn deserialize_many2one<'de, D>(deserializer: D) -> Result<Option<Many2One>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decode_many2one(&value).map_err(serde::de::Error::custom)
}

pub fn deserialize_id_list<'de, D>(deserializer: D) -> Result<Vec<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decode_id_list(&value).map_err(serde::de::Error::custom)
}

pub fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_text(&value))
}
