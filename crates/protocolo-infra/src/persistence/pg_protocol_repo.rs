//! PostgreSQL implementation of ProtocolRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use protocolo_domain::model::{NewProtocol, ProtocolRecord};
use protocolo_domain::repository::ProtocolRepository;
use protocolo_domain::service::PurgeGrant;
use protocolo_types::{Error, Result};

pub const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS protocolo (
        id SERIAL PRIMARY KEY,
        rota TEXT NOT NULL,
        motorista TEXT NOT NULL,
        transportadora TEXT NOT NULL,
        pedido TEXT,
        remessa TEXT,
        nota_fiscal TEXT,
        motivo TEXT,
        data_registro DATE
    )";

const FIND_BY_ID_SQL: &str = "SELECT id, rota, motorista, transportadora, pedido, remessa, \
     nota_fiscal, motivo, data_registro FROM protocolo WHERE id = $1";

const LIST_ALL_SQL: &str = "SELECT id, rota, motorista, transportadora, pedido, remessa, \
     nota_fiscal, motivo, data_registro FROM protocolo ORDER BY id";

/// Row as laid out in the `protocolo` table
#[derive(Debug, sqlx::FromRow)]
struct ProtocoloRow {
    id: i32,
    rota: String,
    motorista: String,
    transportadora: String,
    pedido: Option<String>,
    remessa: Option<String>,
    nota_fiscal: Option<String>,
    motivo: Option<String>,
    data_registro: Option<NaiveDate>,
}

impl From<ProtocoloRow> for ProtocolRecord {
    fn from(row: ProtocoloRow) -> Self {
        ProtocolRecord {
            id: row.id,
            route: row.rota,
            driver: row.motorista,
            carrier: row.transportadora,
            order: row.pedido,
            shipment: row.remessa,
            invoice: row.nota_fiscal,
            reason: row.motivo,
            registered_on: row.data_registro,
        }
    }
}

fn storage_error(e: sqlx::Error) -> Error {
    Error::Storage(e.to_string())
}

/// Repository over a PostgreSQL pool. Opened once and passed down; call
/// `close` on shutdown.
#[derive(Clone)]
pub struct PgProtocolRepository {
    pool: PgPool,
}

impl PgProtocolRepository {
    /// Connect eagerly so an unreachable database fails at startup
    pub async fn connect(options: PgConnectOptions, max_connections: u32) -> Result<Self> {
        log::debug!("Connecting to PostgreSQL (max {} connections)", max_connections);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ProtocolRepository for PgProtocolRepository {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        log::info!("Table 'protocolo' is ready");
        Ok(())
    }

    async fn insert(&self, protocol: &NewProtocol) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO protocolo
                (rota, motorista, transportadora, pedido, remessa, nota_fiscal, motivo, data_registro)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(&protocol.route)
        .bind(&protocol.driver)
        .bind(&protocol.carrier)
        .bind(protocol.order.as_deref())
        .bind(protocol.shipment.as_deref())
        .bind(protocol.invoice.as_deref())
        .bind(protocol.reason.as_deref())
        .bind(protocol.registered_on)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        log::info!("Inserted protocol {}", id);
        Ok(id)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<ProtocolRecord>> {
        log::debug!("Looking up protocol {}", id);
        let row: Option<ProtocoloRow> = sqlx::query_as(FIND_BY_ID_SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<ProtocolRecord>> {
        let rows: Vec<ProtocoloRow> = sqlx::query_as(LIST_ALL_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        log::debug!("Listed {} protocols", rows.len());
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_all(&self, _grant: &PurgeGrant) -> Result<u64> {
        let deleted = sqlx::query("DELETE FROM protocolo")
            .execute(&self.pool)
            .await
            .map_err(storage_error)?
            .rows_affected();
        log::info!("Deleted {} protocols", deleted);
        Ok(deleted)
    }

    async fn close(&self) {
        self.pool.close().await;
        log::debug!("PostgreSQL pool closed");
    }
}
