//! Typed access to the remote models.
//!
//! Each repository is a zero-sized struct with async associated functions
//! taking the transport and the caller's credentials, mirroring one remote
//! model.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use serviparts_core::types::{FieldMap, RecordId};

use crate::models::{
    Attachment, ChecklistLine, Equipment, MaintenanceRequestDetails, MaintenanceRequestSummary,
    NewMaintenanceRequest, Partner, User, DETAIL_FIELDS, MODEL_ATTACHMENT, MODEL_CHECKLIST_LINE,
    MODEL_EQUIPMENT, MODEL_MAINTENANCE_REQUEST, MODEL_PARTNER, MODEL_USER, SUMMARY_FIELDS,
};
use crate::rpc::{RpcClient, RpcError};
use crate::session::Credentials;

/// Decode an RPC result into rows.
fn decode<T: DeserializeOwned>(model: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::Malformed(format!("unexpected {model} payload: {e}")))
}

/// `search_read` with a domain, field list and order.
async fn search_read<T: DeserializeOwned>(
    rpc: &RpcClient,
    creds: &Credentials,
    model: &str,
    domain: Value,
    fields: &[&str],
    order: &str,
) -> Result<Vec<T>, RpcError> {
    let rows = rpc
        .execute_kw(
            creds,
            model,
            "search_read",
            vec![domain],
            json!({ "fields": fields, "order": order }),
        )
        .await?;
    decode(model, rows)
}

/// `read` of explicit ids. An empty id list short-circuits to no rows.
async fn read_ids<T: DeserializeOwned>(
    rpc: &RpcClient,
    creds: &Credentials,
    model: &str,
    ids: &[RecordId],
    fields: &[&str],
) -> Result<Vec<T>, RpcError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = rpc
        .execute_kw(creds, model, "read", vec![json!(ids)], json!({ "fields": fields }))
        .await?;
    decode(model, rows)
}

// ---------------------------------------------------------------------------
// maintenance.request
// ---------------------------------------------------------------------------

pub struct MaintenanceRequestRepo;

impl MaintenanceRequestRepo {
    /// All requests visible to the user, newest first.
    pub async fn list(
        rpc: &RpcClient,
        creds: &Credentials,
    ) -> Result<Vec<MaintenanceRequestSummary>, RpcError> {
        search_read(
            rpc,
            creds,
            MODEL_MAINTENANCE_REQUEST,
            json!([]),
            SUMMARY_FIELDS,
            "request_date desc, id desc",
        )
        .await
    }

    /// Create a request and return its id.
    pub async fn create(
        rpc: &RpcClient,
        creds: &Credentials,
        input: &NewMaintenanceRequest,
    ) -> Result<RecordId, RpcError> {
        let id = rpc
            .execute_kw(
                creds,
                MODEL_MAINTENANCE_REQUEST,
                "create",
                vec![json!(input)],
                json!({}),
            )
            .await?;

        let id: RecordId = decode(MODEL_MAINTENANCE_REQUEST, id)?;
        tracing::info!(uid = creds.uid, request_id = id, "Maintenance request created");
        Ok(id)
    }

    /// Read one request. `None` when it does not exist (or is not visible).
    pub async fn read_details(
        rpc: &RpcClient,
        creds: &Credentials,
        id: RecordId,
    ) -> Result<Option<MaintenanceRequestDetails>, RpcError> {
        let rows: Vec<MaintenanceRequestDetails> =
            read_ids(rpc, creds, MODEL_MAINTENANCE_REQUEST, &[id], DETAIL_FIELDS).await?;
        Ok(rows.into_iter().next())
    }

    /// Write `payload` to one request.
    pub async fn write(
        rpc: &RpcClient,
        creds: &Credentials,
        id: RecordId,
        payload: &FieldMap,
    ) -> Result<(), RpcError> {
        rpc.execute_kw(
            creds,
            MODEL_MAINTENANCE_REQUEST,
            "write",
            vec![json!([id]), json!(payload)],
            json!({}),
        )
        .await?;

        tracing::info!(uid = creds.uid, request_id = id, "Maintenance request updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Selector sources
// ---------------------------------------------------------------------------

pub struct PartnerRepo;

impl PartnerRepo {
    pub async fn list(rpc: &RpcClient, creds: &Credentials) -> Result<Vec<Partner>, RpcError> {
        search_read(rpc, creds, MODEL_PARTNER, json!([]), &["name"], "name asc").await
    }
}

pub struct UserRepo;

impl UserRepo {
    pub async fn list(rpc: &RpcClient, creds: &Credentials) -> Result<Vec<User>, RpcError> {
        search_read(rpc, creds, MODEL_USER, json!([]), &["name", "login"], "name asc").await
    }
}

pub struct EquipmentRepo;

impl EquipmentRepo {
    /// Equipment of `partner`, or all equipment when `partner` is `None`.
    pub async fn list(
        rpc: &RpcClient,
        creds: &Credentials,
        partner: Option<RecordId>,
    ) -> Result<Vec<Equipment>, RpcError> {
        let domain = match partner {
            Some(pid) => json!([["partner_id", "=", pid]]),
            None => json!([]),
        };
        search_read(
            rpc,
            creds,
            MODEL_EQUIPMENT,
            domain,
            &["name", "serial_no", "partner_id"],
            "name asc",
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Sub-records
// ---------------------------------------------------------------------------

pub struct AttachmentRepo;

impl AttachmentRepo {
    pub async fn read(
        rpc: &RpcClient,
        creds: &Credentials,
        ids: &[RecordId],
    ) -> Result<Vec<Attachment>, RpcError> {
        read_ids(rpc, creds, MODEL_ATTACHMENT, ids, &["name", "mimetype", "datas"]).await
    }
}

pub struct ChecklistLineRepo;

impl ChecklistLineRepo {
    pub async fn read(
        rpc: &RpcClient,
        creds: &Credentials,
        ids: &[RecordId],
    ) -> Result<Vec<ChecklistLine>, RpcError> {
        read_ids(rpc, creds, MODEL_CHECKLIST_LINE, ids, &["name", "is_done"]).await
    }
}
