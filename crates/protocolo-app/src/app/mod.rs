//! Use cases

pub mod protocol_service;

pub use protocol_service::{Action, ExportSettings, ProtocolService, Response};
