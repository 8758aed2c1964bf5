// [libs/infra/db/src/client.rs]
//! Connection bootstrap. Handles the three libsql URL shapes the
//! service is deployed against: a remote Turso cluster, a local file,
//! and an in-memory database used by tests.

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{debug, info, instrument};

use crate::errors::DbError;
use crate::schema::apply_schema;

#[derive(Clone)]
pub struct GrantStoreClient {
    database: Arc<Database>,
    /// Keeps an in-memory database alive for the lifetime of the
    /// client; SQLite drops an in-memory database once its last
    /// connection closes, so the anchor connection is never closed.
    _memory_anchor: Option<Arc<Connection>>,
}

impl GrantStoreClient {
    #[instrument(skip(access_token))]
    pub async fn connect(connection_url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        if connection_url.is_empty() {
            return Err(DbError::Configuration("DATABASE_URL is empty".into()));
        }

        info!(url = %connection_url, "connecting to grant store");

        let is_remote = connection_url.starts_with("libsql://") || connection_url.starts_with("https://");
        let is_memory = connection_url.contains(":memory:") || connection_url.contains("mode=memory");

        let database = if is_remote {
            let token = access_token
                .ok_or_else(|| DbError::Configuration("remote connection requires an access token".into()))?;
            Builder::new_remote(connection_url.to_string(), token)
                .build()
                .await
        } else {
            Builder::new_local(connection_url).build().await
        }
        .map_err(|e| DbError::Connection(e.to_string()))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = database.connect().map_err(|e| DbError::Connection(e.to_string()))?;
            apply_schema(&anchor_conn).await.map_err(|e| DbError::Connection(e.to_string()))?;
            anchor = Some(Arc::new(anchor_conn));
            debug!("in-memory database anchored for the lifetime of this client");
        } else {
            let bootstrap_conn = database.connect().map_err(|e| DbError::Connection(e.to_string()))?;
            apply_schema(&bootstrap_conn).await.map_err(|e| DbError::Connection(e.to_string()))?;
        }

        Ok(GrantStoreClient { database, _memory_anchor: anchor })
    }

    pub fn connection(&self) -> Result<Connection, DbError> {
        self.database.connect().map_err(|e| DbError::Connection(e.to_string()))
    }

    /// Round-trips a trivial query against a fresh connection; used by
    /// the health probe to confirm the store is actually reachable
    /// rather than just that a `Connection` handle can be constructed.
    pub async fn ping(&self) -> Result<(), DbError> {
        let conn = self.connection()?;
        conn.query("SELECT 1", ()).await.map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(())
    }
}
