//! Shared types and rules for the Battery Health certificate tool
//!
//! This crate contains the certificate model, the make reference table and
//! the field validation rules. It performs no I/O so it can be used by the
//! client, the CLI and the browser (via WASM) alike.

pub mod models;
pub mod reference;
pub mod types;
pub mod validation;

pub use models::*;
pub use reference::*;
pub use types::*;
pub use validation::*;
