//! In-process implementation of ProtocolRepository
//!
//! Mirrors SERIAL semantics: ids start at 1, are never reused, and keep
//! counting after a purge.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use protocolo_domain::model::{NewProtocol, ProtocolRecord};
use protocolo_domain::repository::ProtocolRepository;
use protocolo_domain::service::PurgeGrant;
use protocolo_types::{Error, Result};

#[derive(Debug)]
struct MemoryState {
    next_id: i32,
    rows: Vec<ProtocolRecord>,
}

#[derive(Debug)]
pub struct MemoryProtocolRepository {
    state: Mutex<MemoryState>,
}

impl Default for MemoryProtocolRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProtocolRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                rows: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProtocolRepository for MemoryProtocolRepository {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, protocol: &NewProtocol) -> Result<i32> {
        let mut state = self.lock()?;
        let id = state.next_id;
        state.next_id += 1;
        state.rows.push(protocol.clone().with_id(id));
        log::info!("Inserted protocol {} (memory)", id);
        Ok(id)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<ProtocolRecord>> {
        let state = self.lock()?;
        Ok(state.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ProtocolRecord>> {
        Ok(self.lock()?.rows.clone())
    }

    async fn delete_all(&self, _grant: &PurgeGrant) -> Result<u64> {
        let mut state = self.lock()?;
        let deleted = state.rows.len() as u64;
        state.rows.clear();
        log::info!("Deleted {} protocols (memory)", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocolo_domain::service::{PurgeAuthorizer, SharedSecretGate};

    #[tokio::test]
    async fn test_ids_increase_and_survive_purge() {
        let repo = MemoryProtocolRepository::new();
        let first = repo.insert(&NewProtocol::new("R1", "Ana", "Rápido")).await.unwrap();
        let second = repo.insert(&NewProtocol::new("R2", "Bia", "Rápido")).await.unwrap();
        assert!(second > first);

        let grant = SharedSecretGate::new(Some("x".to_string()))
            .authorize("x")
            .unwrap();
        assert_eq!(repo.delete_all(&grant).await.unwrap(), 2);
        assert!(repo.list_all().await.unwrap().is_empty());

        let third = repo.insert(&NewProtocol::new("R3", "Caio", "Rápido")).await.unwrap();
        assert!(third > second);
    }

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let repo = MemoryProtocolRepository::new();
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }
}
