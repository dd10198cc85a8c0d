//! Maintenance request edit screen.
//!
//! The form loads a request with its selector lists, evidence photos and
//! checklist lines, lets the technician edit everything locally, and sends
//! one `write` whose nested collections are reconciled into create, update
//! and delete commands.

use chrono::NaiveDateTime;
use serde_json::{json, Value};

use serviparts_core::error::CoreError;
use serviparts_core::maintenance::{
    self, checklist_fields, datetime_field_value, evidence_fields, parse_remote_datetime,
    signature_data_uri, signature_field_value, validate_title, EquipmentCondition, HourType,
    MaintenanceType, MediaAsset, PendingWork, ServiceRating,
};
use serviparts_core::reconcile::{commands_field_value, EditSession, ReplaceSet, SubRecord};
use serviparts_core::types::{FieldMap, RecordId};
use serviparts_odoo::models::{Attachment, ChecklistLine, MaintenanceRequestDetails};
use serviparts_odoo::repositories::{AttachmentRepo, ChecklistLineRepo, MaintenanceRequestRepo};
use serviparts_odoo::selectors::{load_equipment, load_selectors, SelectorLists};
use serviparts_odoo::session::Credentials;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::screen::{InFlight, ScreenLifetime};

/// Result of pressing save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The write was accepted.
    Saved,
    /// A save was already running; nothing was sent.
    AlreadySaving,
}

/// Edit screen state for one maintenance request.
#[derive(Debug)]
pub struct EditForm {
    request_id: RecordId,

    pub title: String,
    pub description: String,
    pub maintenance_type: MaintenanceType,
    pub hour_type: HourType,
    pub equipment_found_status: EquipmentCondition,
    pub equipment_final_status: EquipmentCondition,
    pub has_pending: PendingWork,
    pub pending_comments: String,
    pub service_rating: ServiceRating,
    pub signed_by_customer: String,
    pub signed_by_technician: String,
    pub execution_start: Option<NaiveDateTime>,
    pub execution_end: Option<NaiveDateTime>,

    partner: Option<RecordId>,
    equipment: Option<RecordId>,
    technicians: Vec<RecordId>,
    /// Signature as a PNG data URI.
    signature: Option<String>,

    checklist: EditSession,
    evidence: EditSession,
    /// Previews of the persisted photos still attached.
    photos: Vec<Attachment>,

    selectors: SelectorLists,
    saving: InFlight,
}

impl EditForm {
    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load request `request_id`.
    ///
    /// Returns `Ok(None)` when `screen` was torn down before the load
    /// finished; the fetched data is dropped in that case.
    pub async fn load(
        ctx: &AppContext,
        creds: &Credentials,
        request_id: RecordId,
        screen: &ScreenLifetime,
    ) -> AppResult<Option<Self>> {
        screen
            .settle("edit form", Self::fetch(ctx, creds, request_id))
            .await
            .transpose()
    }

    async fn fetch(ctx: &AppContext, creds: &Credentials, request_id: RecordId) -> AppResult<Self> {
        let rpc = ctx.rpc();

        let details = MaintenanceRequestRepo::read_details(rpc, creds, request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Maintenance request",
                id: request_id,
            })?;

        let partner = details.partner_id.as_ref().map(|p| p.id);
        let (selectors, photos, lines) = tokio::join!(
            load_selectors(rpc, creds, partner),
            AttachmentRepo::read(rpc, creds, &details.evidence_ids),
            ChecklistLineRepo::read(rpc, creds, &details.checklist_ids),
        );

        let form = Self::from_details(details, selectors, photos?, lines?);
        tracing::info!(
            request_id,
            checklist = form.checklist().len(),
            photos = form.photos.len(),
            "Edit form loaded",
        );
        Ok(form)
    }

    /// Build the form from already fetched rows.
    ///
    /// Unknown selection values fall back to their defaults and unparsable
    /// dates are left empty; both are logged.
    pub fn from_details(
        details: MaintenanceRequestDetails,
        selectors: SelectorLists,
        photos: Vec<Attachment>,
        lines: Vec<ChecklistLine>,
    ) -> Self {
        let request_id = details.id;

        let checklist =
            EditSession::from_remote(lines.iter().map(ChecklistLine::to_sub_record).collect());
        let evidence =
            EditSession::from_remote(photos.iter().map(Attachment::to_sub_record).collect());

        Self {
            request_id,
            title: details.request_title.unwrap_or_default(),
            description: details.description.unwrap_or_default(),
            maintenance_type: selection(
                request_id,
                maintenance::FIELD_MAINTENANCE_TYPE,
                details.maintenance_type.as_deref(),
                MaintenanceType::from_str,
            ),
            hour_type: selection(
                request_id,
                maintenance::FIELD_HOUR_TYPE,
                details.hour_type.as_deref(),
                HourType::from_str,
            ),
            equipment_found_status: selection(
                request_id,
                maintenance::FIELD_EQUIPMENT_FOUND_STATUS,
                details.equipment_found_status.as_deref(),
                EquipmentCondition::from_str,
            ),
            equipment_final_status: selection(
                request_id,
                maintenance::FIELD_EQUIPMENT_FINAL_STATUS,
                details.equipment_final_status.as_deref(),
                EquipmentCondition::from_str,
            ),
            has_pending: selection(
                request_id,
                maintenance::FIELD_HAS_PENDING,
                details.has_pending.as_deref(),
                PendingWork::from_str,
            ),
            pending_comments: details.pending_comments.unwrap_or_default(),
            service_rating: selection(
                request_id,
                maintenance::FIELD_SERVICE_RATING,
                details.service_rating.as_deref(),
                ServiceRating::from_str,
            ),
            signed_by_customer: details.signed_by_customer.unwrap_or_default(),
            signed_by_technician: details.signed_by_technician.unwrap_or_default(),
            execution_start: datetime(
                request_id,
                maintenance::FIELD_EXECUTION_START,
                details.execution_start_date.as_deref(),
            ),
            execution_end: datetime(
                request_id,
                maintenance::FIELD_EXECUTION_END,
                details.execution_end_date.as_deref(),
            ),
            partner: details.partner_id.map(|p| p.id),
            equipment: details.equipment_id.map(|e| e.id),
            technicians: details.technician_id,
            signature: details.customer_signature.as_deref().map(signature_data_uri),
            checklist,
            evidence,
            photos,
            selectors,
            saving: InFlight::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn request_id(&self) -> RecordId {
        self.request_id
    }

    pub fn partner(&self) -> Option<RecordId> {
        self.partner
    }

    pub fn equipment(&self) -> Option<RecordId> {
        self.equipment
    }

    pub fn technicians(&self) -> &[RecordId] {
        &self.technicians
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn checklist(&self) -> &[SubRecord] {
        self.checklist.items()
    }

    pub fn evidence(&self) -> &[SubRecord] {
        self.evidence.items()
    }

    pub fn photos(&self) -> &[Attachment] {
        &self.photos
    }

    pub fn selectors(&self) -> &SelectorLists {
        &self.selectors
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_busy()
    }

    // -----------------------------------------------------------------------
    // Checklist
    // -----------------------------------------------------------------------

    /// Append an unchecked line and return its index.
    pub fn add_checklist_item(&mut self, name: &str) -> usize {
        self.checklist.push(checklist_fields(name, false))
    }

    pub fn rename_checklist_item(&mut self, index: usize, name: &str) -> bool {
        self.checklist.set_field(index, maintenance::FIELD_NAME, name)
    }

    /// Flip the done flag of a line. Returns `false` when out of range.
    pub fn toggle_checklist_item(&mut self, index: usize) -> bool {
        let Some(item) = self.checklist.items().get(index) else {
            return false;
        };
        let done = item
            .field(maintenance::FIELD_IS_DONE)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        self.checklist.set_field(index, maintenance::FIELD_IS_DONE, !done)
    }

    pub fn remove_checklist_item(&mut self, index: usize) -> bool {
        self.checklist.remove(index).is_some()
    }

    // -----------------------------------------------------------------------
    // Evidence
    // -----------------------------------------------------------------------

    /// Attach a picked photo and return its index.
    pub fn add_evidence(&mut self, asset: &MediaAsset) -> usize {
        self.evidence.push(evidence_fields(asset))
    }

    /// Detach a photo. A persisted photo is also dropped from the previews.
    pub fn remove_evidence(&mut self, index: usize) -> bool {
        match self.evidence.remove(index) {
            Some(removed) => {
                if let Some(id) = removed.id {
                    self.photos.retain(|p| p.id != id);
                }
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Relations and signature
    // -----------------------------------------------------------------------

    /// Select a customer, clear the equipment and reload the equipment list.
    ///
    /// A failed reload leaves the list empty.
    pub async fn select_partner(
        &mut self,
        ctx: &AppContext,
        creds: &Credentials,
        partner: Option<RecordId>,
    ) {
        self.partner = partner;
        self.equipment = None;
        self.selectors.equipment = load_equipment(ctx.rpc(), creds, partner).await;
        tracing::debug!(
            request_id = self.request_id,
            ?partner,
            equipment = self.selectors.equipment.len(),
            "Partner selected",
        );
    }

    pub fn select_equipment(&mut self, equipment: Option<RecordId>) {
        self.equipment = equipment;
    }

    /// Add or remove a technician. Returns whether it is now selected.
    pub fn toggle_technician(&mut self, user: RecordId) -> bool {
        if let Some(pos) = self.technicians.iter().position(|id| *id == user) {
            self.technicians.remove(pos);
            false
        } else {
            self.technicians.push(user);
            true
        }
    }

    /// Replace the captured signature; `None` clears it.
    pub fn set_signature(&mut self, data_uri: Option<String>) {
        self.signature = data_uri.filter(|s| !s.is_empty());
    }

    // -----------------------------------------------------------------------
    // Saving
    // -----------------------------------------------------------------------

    /// Fields sent by [`EditForm::save`].
    pub fn build_payload(&self) -> AppResult<FieldMap> {
        let title = validate_title(&self.title)?;

        let pending_comments = match self.has_pending {
            PendingWork::Yes => self.pending_comments.as_str(),
            PendingWork::No => "",
        };

        let mut payload = FieldMap::new();
        payload.insert(maintenance::FIELD_TITLE.into(), json!(title));
        payload.insert(maintenance::FIELD_PARTNER.into(), id_or_false(self.partner));
        payload.insert(maintenance::FIELD_EQUIPMENT.into(), id_or_false(self.equipment));
        payload.insert(
            maintenance::FIELD_TECHNICIANS.into(),
            ReplaceSet(self.technicians.clone()).to_field_value(),
        );
        payload.insert(maintenance::FIELD_MAINTENANCE_TYPE.into(), self.maintenance_type.into());
        payload.insert(maintenance::FIELD_HOUR_TYPE.into(), self.hour_type.into());
        payload.insert(
            maintenance::FIELD_EQUIPMENT_FOUND_STATUS.into(),
            self.equipment_found_status.into(),
        );
        payload.insert(
            maintenance::FIELD_EQUIPMENT_FINAL_STATUS.into(),
            self.equipment_final_status.into(),
        );
        payload.insert(maintenance::FIELD_HAS_PENDING.into(), self.has_pending.into());
        payload.insert(maintenance::FIELD_PENDING_COMMENTS.into(), json!(pending_comments));
        payload.insert(maintenance::FIELD_SERVICE_RATING.into(), self.service_rating.into());
        payload.insert(
            maintenance::FIELD_SIGNED_BY_CUSTOMER.into(),
            json!(self.signed_by_customer),
        );
        payload.insert(
            maintenance::FIELD_SIGNED_BY_TECHNICIAN.into(),
            json!(self.signed_by_technician),
        );
        payload.insert(maintenance::FIELD_DESCRIPTION.into(), json!(self.description));
        payload.insert(
            maintenance::FIELD_EXECUTION_START.into(),
            datetime_field_value(self.execution_start),
        );
        payload.insert(
            maintenance::FIELD_EXECUTION_END.into(),
            datetime_field_value(self.execution_end),
        );
        payload.insert(
            maintenance::FIELD_CUSTOMER_SIGNATURE.into(),
            signature_field_value(self.signature.as_deref()),
        );

        if let Some(commands) = commands_field_value(&self.evidence.commands()) {
            payload.insert(maintenance::FIELD_EVIDENCE.into(), commands);
        }
        if let Some(commands) = commands_field_value(&self.checklist.commands()) {
            payload.insert(maintenance::FIELD_CHECKLIST.into(), commands);
        }

        Ok(payload)
    }

    /// Send the edited request.
    ///
    /// A press while a previous save is still running returns
    /// [`SaveOutcome::AlreadySaving`] without sending anything. A failed
    /// save keeps all local edits.
    pub async fn save(&self, ctx: &AppContext, creds: &Credentials) -> AppResult<SaveOutcome> {
        let Some(_guard) = self.saving.try_begin() else {
            tracing::debug!(request_id = self.request_id, "Save already in flight");
            return Ok(SaveOutcome::AlreadySaving);
        };

        let payload = self.build_payload()?;
        MaintenanceRequestRepo::write(ctx.rpc(), creds, self.request_id, &payload).await?;

        tracing::info!(
            request_id = self.request_id,
            fields = payload.len(),
            "Maintenance request saved",
        );
        Ok(SaveOutcome::Saved)
    }
}

fn id_or_false(id: Option<RecordId>) -> Value {
    id.map_or(Value::Bool(false), |id| json!(id))
}

fn selection<T: Default>(
    request_id: RecordId,
    field: &str,
    raw: Option<&str>,
    parse: fn(&str) -> Result<T, CoreError>,
) -> T {
    let Some(raw) = raw else {
        return T::default();
    };
    parse(raw).unwrap_or_else(|e| {
        tracing::warn!(request_id, field, error = %e, "Unknown selection value, using default");
        T::default()
    })
}

fn datetime(request_id: RecordId, field: &str, raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?;
    parse_remote_datetime(raw)
        .inspect_err(|e| tracing::warn!(request_id, field, error = %e, "Ignoring unreadable date"))
        .ok()
}
