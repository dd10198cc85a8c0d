//! Maintenance request vocabulary and wire helpers.
//!
//! Provides the selection-field enums of `maintenance.request`, field name
//! constants, datetime and signature encoding, and the field maps used for
//! checklist lines and evidence photos.

use chrono::NaiveDateTime;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::types::FieldMap;

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

pub const FIELD_NAME: &str = "name";
pub const FIELD_TITLE: &str = "request_title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_MAINTENANCE_TYPE: &str = "maintenance_type";
pub const FIELD_HOUR_TYPE: &str = "hour_type";
pub const FIELD_EQUIPMENT_FOUND_STATUS: &str = "equipment_found_status";
pub const FIELD_EQUIPMENT_FINAL_STATUS: &str = "equipment_final_status";
pub const FIELD_HAS_PENDING: &str = "has_pending";
pub const FIELD_PENDING_COMMENTS: &str = "pending_comments";
pub const FIELD_SERVICE_RATING: &str = "service_rating";
pub const FIELD_SIGNED_BY_CUSTOMER: &str = "signed_by_customer";
pub const FIELD_SIGNED_BY_TECHNICIAN: &str = "signed_by_technician";
pub const FIELD_PARTNER: &str = "partner_id";
pub const FIELD_EQUIPMENT: &str = "equipment_id";
pub const FIELD_TECHNICIANS: &str = "technician_id";
pub const FIELD_EXECUTION_START: &str = "execution_start_date";
pub const FIELD_EXECUTION_END: &str = "execution_end_date";
pub const FIELD_CUSTOMER_SIGNATURE: &str = "customer_signature";
pub const FIELD_CHECKLIST: &str = "checklist_ids";
pub const FIELD_EVIDENCE: &str = "evidence_ids";

/// Checklist line fields.
pub const FIELD_IS_DONE: &str = "is_done";

/// Attachment fields.
pub const FIELD_DATAS: &str = "datas";
pub const FIELD_ATTACHMENT_TYPE: &str = "type";

/// File name used for new evidence photos that carry none.
pub const DEFAULT_EVIDENCE_NAME: &str = "evidence.jpg";

// ---------------------------------------------------------------------------
// Selection enums
// ---------------------------------------------------------------------------

macro_rules! define_selection_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $val)] $variant ),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the remote selection value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $val ),+
                }
            }

            /// Parse a remote selection value.
            pub fn from_str(s: &str) -> Result<Self, CoreError> {
                match s {
                    $( $val => Ok(Self::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Unknown {}: '{other}'. Valid values: {}",
                        $label,
                        [$($val),+].join(", ")
                    ))),
                }
            }
        }

        impl From<$name> for Value {
            fn from(value: $name) -> Self {
                Value::String(value.as_str().to_string())
            }
        }
    };
}

define_selection_enum! {
    /// Kind of maintenance intervention.
    MaintenanceType, "maintenance type" {
        Corrective = "corrective",
        Preventive = "preventive",
    }
}

define_selection_enum! {
    /// How the technician's hours are billed.
    HourType, "hour type" {
        Operational = "operational",
        Snack = "snack",
        Transfer = "transfer",
    }
}

define_selection_enum! {
    /// Equipment condition, both as found and at the end of the visit.
    EquipmentCondition, "equipment status" {
        Operative = "operative",
        Inoperative = "inoperative",
    }
}

define_selection_enum! {
    /// Whether work remains pending after the visit.
    PendingWork, "pending flag" {
        Yes = "yes",
        No = "no",
    }
}

define_selection_enum! {
    /// Customer rating of the service.
    ServiceRating, "service rating" {
        Good = "good",
        Regular = "regular",
        Bad = "bad",
    }
}

impl Default for MaintenanceType {
    fn default() -> Self {
        Self::Corrective
    }
}

impl Default for HourType {
    fn default() -> Self {
        Self::Operational
    }
}

impl Default for EquipmentCondition {
    fn default() -> Self {
        Self::Operative
    }
}

impl Default for PendingWork {
    fn default() -> Self {
        Self::No
    }
}

impl Default for ServiceRating {
    fn default() -> Self {
        Self::Good
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a request title, returning it trimmed.
pub fn validate_title(title: &str) -> Result<&str, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("The title is required".to_string()));
    }
    Ok(trimmed)
}

// ---------------------------------------------------------------------------
// Datetimes
// ---------------------------------------------------------------------------

/// Wall-clock datetime format used by the remote system.
pub const REMOTE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Encode an optional datetime; `None` becomes `false`.
pub fn datetime_field_value(value: Option<NaiveDateTime>) -> Value {
    match value {
        Some(dt) => Value::String(dt.format(REMOTE_DATETIME_FORMAT).to_string()),
        None => Value::Bool(false),
    }
}

/// Parse a remote datetime. A `T` separator is accepted as well.
pub fn parse_remote_datetime(raw: &str) -> Result<NaiveDateTime, CoreError> {
    let normalized = raw.trim().replacen('T', " ", 1);
    let without_fraction = normalized.split('.').next().unwrap_or(&normalized);
    NaiveDateTime::parse_from_str(without_fraction, REMOTE_DATETIME_FORMAT)
        .map_err(|e| CoreError::Malformed(format!("invalid datetime '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// Prefix produced by the signature pad and expected by image views.
pub const SIGNATURE_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Return the raw base64 payload of a data URI, or the input unchanged.
pub fn strip_data_uri(value: &str) -> &str {
    match value.split_once("base64,") {
        Some((_, payload)) => payload,
        None => value,
    }
}

/// Encode a captured signature for the write payload; `None` becomes `false`.
pub fn signature_field_value(signature: Option<&str>) -> Value {
    match signature {
        Some(sig) if !sig.is_empty() => Value::String(strip_data_uri(sig).to_string()),
        _ => Value::Bool(false),
    }
}

/// Wrap a stored base64 signature as a PNG data URI.
pub fn signature_data_uri(raw: &str) -> String {
    format!("{SIGNATURE_DATA_URI_PREFIX}{raw}")
}

// ---------------------------------------------------------------------------
// Sub-record field maps
// ---------------------------------------------------------------------------

/// Fields of one checklist line.
pub fn checklist_fields(name: &str, is_done: bool) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(FIELD_NAME.to_string(), json!(name));
    fields.insert(FIELD_IS_DONE.to_string(), json!(is_done));
    fields
}

/// A photo returned by the camera or gallery picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub uri: String,
    pub base64: String,
    pub file_name: Option<String>,
}

/// Fields of a new evidence attachment built from a picked photo.
pub fn evidence_fields(asset: &MediaAsset) -> FieldMap {
    let name = asset
        .file_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_EVIDENCE_NAME);

    let mut fields = FieldMap::new();
    fields.insert(FIELD_NAME.to_string(), json!(name));
    fields.insert(FIELD_DATAS.to_string(), json!(asset.base64));
    fields.insert(FIELD_ATTACHMENT_TYPE.to_string(), json!("binary"));
    fields
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn selection_round_trip_through_str() {
        for t in HourType::ALL {
            assert_eq!(HourType::from_str(t.as_str()).unwrap(), *t);
        }
        assert_eq!(ServiceRating::Regular.as_str(), "regular");
        assert!(MaintenanceType::from_str("urgent").is_err());
    }

    #[test]
    fn selection_serde_uses_remote_values() {
        assert_eq!(
            serde_json::to_value(EquipmentCondition::Inoperative).unwrap(),
            json!("inoperative")
        );
        let parsed: PendingWork = serde_json::from_value(json!("yes")).unwrap();
        assert_eq!(parsed, PendingWork::Yes);
    }

    #[test]
    fn defaults_match_new_form_state() {
        assert_eq!(MaintenanceType::default(), MaintenanceType::Corrective);
        assert_eq!(PendingWork::default(), PendingWork::No);
        assert_eq!(ServiceRating::default(), ServiceRating::Good);
    }

    #[test]
    fn title_is_trimmed_and_required() {
        assert_eq!(validate_title("  Pump leak ").unwrap(), "Pump leak");
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn datetime_encoding() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        assert_eq!(datetime_field_value(Some(dt)), json!("2024-03-05 14:07:00"));
        assert_eq!(datetime_field_value(None), json!(false));
    }

    #[test]
    fn datetime_parsing_accepts_both_separators() {
        let a = parse_remote_datetime("2024-03-05 14:07:00").unwrap();
        let b = parse_remote_datetime("2024-03-05T14:07:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_remote_datetime("yesterday").is_err());
    }

    #[test]
    fn signature_prefix_is_stripped() {
        assert_eq!(
            signature_field_value(Some("data:image/png;base64,QUJD")),
            json!("QUJD")
        );
        assert_eq!(signature_field_value(Some("QUJD")), json!("QUJD"));
        assert_eq!(signature_field_value(None), json!(false));
        assert_eq!(signature_data_uri("QUJD"), "data:image/png;base64,QUJD");
    }

    #[test]
    fn evidence_defaults_file_name() {
        let asset = MediaAsset {
            uri: "file:///tmp/a.jpg".into(),
            base64: "AAAA".into(),
            file_name: None,
        };
        let fields = evidence_fields(&asset);
        assert_eq!(fields["name"], json!(DEFAULT_EVIDENCE_NAME));
        assert_eq!(fields["datas"], json!("AAAA"));
        assert_eq!(fields["type"], json!("binary"));
    }
}
