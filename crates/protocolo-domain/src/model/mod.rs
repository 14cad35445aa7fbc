//! Domain model types

pub mod protocol;

pub use protocol::{NewProtocol, ProtocolRecord};
