//! Repository trait definitions for data persistence

use async_trait::async_trait;

use crate::model::{NewProtocol, ProtocolRecord};
use crate::service::PurgeGrant;
use protocolo_types::Error;

/// Repository for protocol records (table `protocolo`)
#[async_trait]
pub trait ProtocolRepository: Send + Sync {
    /// Create the backing table if it does not exist yet
    async fn ensure_schema(&self) -> Result<(), Error>;

    /// Insert a protocol and return the identifier assigned by the store
    async fn insert(&self, protocol: &NewProtocol) -> Result<i32, Error>;

    /// Find a protocol by identifier
    async fn find_by_id(&self, id: i32) -> Result<Option<ProtocolRecord>, Error>;

    /// All protocols in storage order
    async fn list_all(&self) -> Result<Vec<ProtocolRecord>, Error>;

    /// Remove every protocol. Requires a grant issued by a [`crate::service::PurgeAuthorizer`].
    async fn delete_all(&self, grant: &PurgeGrant) -> Result<u64, Error>;

    /// Release the underlying connection(s). Called once on shutdown.
    async fn close(&self) {}
}
