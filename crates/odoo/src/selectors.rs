//! Concurrent loading of the edit form's selector lists.
//!
//! Selector reads are independent, so they run together and the form
//! waits for the slowest one. A failed read degrades to an empty list:
//! a missing technician list must not keep the rest of the form from
//! rendering.

use serviparts_core::types::RecordId;

use crate::models::{Equipment, Partner, User};
use crate::repositories::{EquipmentRepo, PartnerRepo, UserRepo};
use crate::rpc::{RpcClient, RpcError};
use crate::session::Credentials;

/// Options offered by the partner, technician and equipment pickers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorLists {
    pub partners: Vec<Partner>,
    pub users: Vec<User>,
    pub equipment: Vec<Equipment>,
}

/// Load all three lists concurrently. Equipment is filtered by `partner`.
pub async fn load_selectors(
    rpc: &RpcClient,
    creds: &Credentials,
    partner: Option<RecordId>,
) -> SelectorLists {
    let (partners, users, equipment) = tokio::join!(
        PartnerRepo::list(rpc, creds),
        UserRepo::list(rpc, creds),
        EquipmentRepo::list(rpc, creds, partner),
    );

    SelectorLists {
        partners: or_empty("partners", partners),
        users: or_empty("users", users),
        equipment: or_empty("equipment", equipment),
    }
}

/// Equipment list for a newly selected partner, empty on failure.
pub async fn load_equipment(
    rpc: &RpcClient,
    creds: &Credentials,
    partner: Option<RecordId>,
) -> Vec<Equipment> {
    or_empty("equipment", EquipmentRepo::list(rpc, creds, partner).await)
}

/// Unwrap a selector read, logging and degrading failures to no rows.
pub fn or_empty<T>(list: &str, result: Result<Vec<T>, RpcError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(list, error = %e, "Selector list unavailable, showing none");
        Vec::new()
    })
}
