//! `serviparts-app` library crate.
//!
//! Screen controllers of the field-service client (login, create, edit,
//! print) on top of `serviparts-odoo`. The binary entrypoint lives in
//! `main.rs`; the modules are exposed here for integration testing.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod forms;
pub mod print;
pub mod screen;
