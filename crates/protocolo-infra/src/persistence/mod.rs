//! Persistence implementations
//!
//! PostgreSQL for real runs, an in-process store for tests and dry runs.

mod memory_protocol_repo;
mod pg_protocol_repo;

pub use memory_protocol_repo::MemoryProtocolRepository;
pub use pg_protocol_repo::{PgProtocolRepository, CREATE_TABLE_SQL};
