/// Identifier assigned by the remote system when a record is created.
/// Always positive for persisted records.
pub type RecordId = i64;

/// Open-ended field map as the remote system reads and writes it.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Returns `true` if `id` can name a persisted remote record.
pub fn is_persisted_id(id: RecordId) -> bool {
    id > 0
}
