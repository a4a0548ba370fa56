use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use chronicle_core::EntityKind;
use chronicle_store::entity::EntityStore;
use chronicle_store::error::StoreError;

use crate::config::PostgresStoreConfig;
use crate::migrations;

/// Postgres-backed entity store.
///
/// All entity kinds share one `(kind, id)`-keyed JSONB table; each kind
/// behaves as its own collection.
pub struct PostgresEntityStore {
    pool: PgPool,
    table: String,
}

impl PostgresEntityStore {
    /// Create a new store, connecting to Postgres and running migrations.
    pub async fn new(config: &PostgresStoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Self::from_pool(pool, &config.prefix).await
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: PgPool, prefix: &str) -> Result<Self, StoreError> {
        migrations::run_migrations(&pool, prefix)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self {
            pool,
            table: format!("{prefix}entities"),
        })
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    async fn get(
        &self,
        kind: &EntityKind,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let sql = format!("SELECT doc FROM {} WHERE kind = $1 AND id = $2", self.table);

        sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    async fn insert(
        &self,
        kind: &EntityKind,
        mut doc: serde_json::Value,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        match doc.as_object_mut() {
            Some(obj) => {
                obj.insert("id".to_owned(), serde_json::Value::String(id.clone()));
            }
            None => {
                return Err(StoreError::Serialization(
                    "entity document must be a JSON object".to_owned(),
                ));
            }
        }

        let sql = format!(
            "INSERT INTO {} (kind, id, doc) VALUES ($1, $2, $3)",
            self.table
        );
        sqlx::query(&sql)
            .bind(kind.as_str())
            .bind(&id)
            .bind(doc)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(id)
    }

    async fn update(
        &self,
        kind: &EntityKind,
        id: &str,
        doc: serde_json::Value,
    ) -> Result<(), StoreError> {
        if !doc.is_object() {
            return Err(StoreError::Serialization(
                "entity document must be a JSON object".to_owned(),
            ));
        }

        let sql = format!(
            "UPDATE {} SET doc = $3, updated_at = NOW() WHERE kind = $1 AND id = $2",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(kind.as_str())
            .bind(id)
            .bind(doc)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{kind} {id}")));
        }
        Ok(())
    }

    async fn delete(&self, kind: &EntityKind, id: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE kind = $1 AND id = $2", self.table);
        let result = sqlx::query(&sql)
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
