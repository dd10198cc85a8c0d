//! Remote model names and the typed rows read from them.
//!
//! Rows are decoded right after the RPC call returns. Relation fields go
//! through the `serviparts_core::relation` adapters, so callers never see
//! `[id, "label"]` pairs or `false` placeholders.

use serde::{Deserialize, Serialize};

use serviparts_core::maintenance::{self, checklist_fields, MaintenanceType};
use serviparts_core::reconcile::SubRecord;
use serviparts_core::relation::{
    deserialize_id_list, deserialize_many2one, deserialize_text, Many2One,
};
use serviparts_core::types::{FieldMap, RecordId};

// ---------------------------------------------------------------------------
// Model names
// ---------------------------------------------------------------------------

pub const MODEL_MAINTENANCE_REQUEST: &str = "maintenance.request";
pub const MODEL_EQUIPMENT: &str = "maintenance.equipment";
pub const MODEL_PARTNER: &str = "res.partner";
pub const MODEL_USER: &str = "res.users";
pub const MODEL_ATTACHMENT: &str = "ir.attachment";
pub const MODEL_CHECKLIST_LINE: &str = "maintenance.checklist.line";

// ---------------------------------------------------------------------------
// Selector rows
// ---------------------------------------------------------------------------

/// A customer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Partner {
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
}

/// A backend user, selectable as technician.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub login: Option<String>,
}

/// A piece of serviced equipment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Equipment {
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub serial_no: Option<String>,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub partner_id: Option<Many2One>,
}

// ---------------------------------------------------------------------------
// Sub-record rows
// ---------------------------------------------------------------------------

/// One line of a request checklist.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChecklistLine {
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_done: bool,
}

impl ChecklistLine {
    pub fn to_sub_record(&self) -> SubRecord {
        SubRecord::persisted(
            self.id,
            checklist_fields(self.name.as_deref().unwrap_or_default(), self.is_done),
        )
    }
}

/// An evidence photo attached to a request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attachment {
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub mimetype: Option<String>,
    /// Base64 file content, used for previews.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub datas: Option<String>,
}

impl Attachment {
    /// Editing handle for the evidence collection. Only the name is kept;
    /// the file content is never re-sent.
    pub fn to_sub_record(&self) -> SubRecord {
        let mut fields = FieldMap::new();
        if let Some(name) = &self.name {
            fields.insert(maintenance::FIELD_NAME.to_string(), name.clone().into());
        }
        SubRecord::persisted(self.id, fields)
    }
}

// ---------------------------------------------------------------------------
// Maintenance requests
// ---------------------------------------------------------------------------

/// Row of the request list screen.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaintenanceRequestSummary {
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub request_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub request_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub stage_id: Option<Many2One>,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub partner_id: Option<Many2One>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub maintenance_type: Option<String>,
}

impl MaintenanceRequestSummary {
    /// Title shown in lists: the title field, else the reference name.
    pub fn display_title(&self) -> &str {
        self.request_title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// Stage label, `Draft` when the request has no stage yet.
    pub fn stage_label(&self) -> &str {
        self.stage_id
            .as_ref()
            .map(|s| s.label.as_str())
            .unwrap_or("Draft")
    }
}

/// Every field the edit form reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaintenanceRequestDetails {
    pub id: RecordId,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub request_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub maintenance_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub hour_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub equipment_found_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub equipment_final_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub has_pending: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub pending_comments: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub service_rating: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub signed_by_customer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub signed_by_technician: Option<String>,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub partner_id: Option<Many2One>,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub equipment_id: Option<Many2One>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub technician_id: Vec<RecordId>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub execution_start_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub execution_end_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub customer_signature: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub evidence_ids: Vec<RecordId>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub checklist_ids: Vec<RecordId>,
}

/// Fields read for [`MaintenanceRequestDetails`].
pub const DETAIL_FIELDS: &[&str] = &[
    "request_title",
    "description",
    "maintenance_type",
    "hour_type",
    "equipment_found_status",
    "equipment_final_status",
    "has_pending",
    "pending_comments",
    "service_rating",
    "signed_by_customer",
    "signed_by_technician",
    "partner_id",
    "equipment_id",
    "technician_id",
    "execution_start_date",
    "execution_end_date",
    "customer_signature",
    "evidence_ids",
    "checklist_ids",
];

/// Fields read for [`MaintenanceRequestSummary`].
pub const SUMMARY_FIELDS: &[&str] = &[
    "name",
    "request_title",
    "request_date",
    "stage_id",
    "partner_id",
    "maintenance_type",
];

/// Input of the create screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMaintenanceRequest {
    pub name: String,
    pub maintenance_type: MaintenanceType,
    pub description: String,
}
