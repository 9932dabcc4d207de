//! SeaORM-backed store. Documents live as JSON text in a single `documents`
//! table keyed by (collection, id); the schema comes from the `migration` crate.

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::info;

use super::DocumentStore;
use crate::entities::documents;
use crate::error::DocumentError;

#[derive(Debug)]
pub struct SeaStore {
    url: String,
    conn: OnceCell<DatabaseConnection>,
}

impl SeaStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            conn: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connection(
        &self,
        operation: &'static str,
    ) -> Result<&DatabaseConnection, DocumentError> {
        self.conn
            .get()
            .ok_or(DocumentError::NotConnected { operation })
    }

    fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    async fn open(&self) -> Result<DatabaseConnection, DocumentError> {
        let mut opts = ConnectOptions::new(self.url.clone());
        opts.sqlx_logging(false);
        if self.is_memory() {
            // Every pooled connection would otherwise get its own empty database.
            opts.max_connections(1).min_connections(1);
        }

        let conn = Database::connect(opts).await?;
        Migrator::up(&conn, None).await?;
        info!(backend = "sqlite", url = %self.url, "document_store=connected");
        Ok(conn)
    }
}

#[async_trait]
impl DocumentStore for SeaStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn connect(&self) -> Result<(), DocumentError> {
        self.conn.get_or_try_init(|| self.open()).await?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.conn.initialized()
    }

    async fn upsert(&self, collection: &str, id: &str, body: &Value) -> Result<(), DocumentError> {
        let conn = self.connection("upsert")?;
        let row = documents::ActiveModel {
            collection: Set(collection.to_string()),
            id: Set(id.to_string()),
            body: Set(serde_json::to_string(body)?),
        };

        documents::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([documents::Column::Collection, documents::Column::Id])
                    .update_column(documents::Column::Body)
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    async fn load(&self, collection: &str) -> Result<Vec<Value>, DocumentError> {
        let conn = self.connection("load")?;
        let rows = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection))
            .order_by_asc(documents::Column::Id)
            .all(conn)
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_str(&row.body).map_err(DocumentError::from))
            .collect()
    }

    async fn purge(&self) -> Result<(), DocumentError> {
        let conn = self.connection("purge")?;
        documents::Entity::delete_many().exec(conn).await?;
        Ok(())
    }
}
