//! Repository adapters for persistence layer

use protocolo_domain::repository::ProtocolRepository;
use protocolo_infra::persistence::{MemoryProtocolRepository, PgProtocolRepository};
use protocolo_types::Result;

use crate::config::Config;

/// Connect to PostgreSQL and make sure the `protocolo` table exists
pub async fn open_postgres_repo(config: &Config) -> Result<PgProtocolRepository> {
    let db = config.database()?;
    let repo = PgProtocolRepository::connect(db.connect_options(), db.max_connections).await?;
    repo.ensure_schema().await?;
    Ok(repo)
}

/// Process-local store; contents vanish on exit
pub fn open_memory_repo() -> MemoryProtocolRepository {
    MemoryProtocolRepository::new()
}

/// Open the store selected on the command line
pub async fn open_protocol_repo(config: &Config, in_memory: bool) -> Result<Box<dyn ProtocolRepository>> {
    if in_memory {
        log::info!("Using in-memory store; nothing outlives this process");
        Ok(Box::new(open_memory_repo()))
    } else {
        Ok(Box::new(open_postgres_repo(config).await?))
    }
}
