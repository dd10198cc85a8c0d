//! Domain logic for the Serviparts field-service client.
//!
//! Everything in this crate is pure: record identifiers, the nested
//! collection reconciler, relation-field decoding and the maintenance
//! request vocabulary. Network access lives in `serviparts-odoo`.

pub mod error;
pub mod maintenance;
pub mod reconcile;
pub mod relation;
pub mod types;
