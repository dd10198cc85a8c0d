//! JSON-RPC client library for the remote business backend.
//!
//! Provides the RPC envelope transport, the cookie-session manager used
//! for direct document downloads, typed repositories over the remote
//! models, concurrent selector-list loading and report download.

pub mod models;
pub mod report;
pub mod repositories;
pub mod rpc;
pub mod selectors;
pub mod session;
