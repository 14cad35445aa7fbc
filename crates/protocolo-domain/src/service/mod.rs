//! Domain services

pub mod field_split;
pub mod purge_gate;

pub use field_split::{split_composite, DELIMITERS};
pub use purge_gate::{AccessDenied, PurgeAuthorizer, PurgeGrant, SharedSecretGate};
