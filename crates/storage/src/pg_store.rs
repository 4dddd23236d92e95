//! PostgreSQL document store using sqlx.
//!
//! Counters, JSONB documents and index sets each live in their own table.
//! Every trait method is exactly one statement.

use std::collections::HashMap;

use async_trait::async_trait;
use lightchat_core::{
    PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::error::StorageError;
use crate::pg_migrations::run_pg_migrations;
use crate::traits::DocumentStore;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(std::time::Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStore initialized");
        Ok(Self { pool })
    }
}

fn to_member(value: u64) -> Result<i64, StorageError> {
    i64::try_from(value).map_err(|e| StorageError::DataCorruption {
        context: format!("set member {value} exceeds BIGINT"),
        source: Box::new(e),
    })
}

fn from_bigint(value: i64, what: &str) -> Result<u64, StorageError> {
    u64::try_from(value).map_err(|e| StorageError::DataCorruption {
        context: format!("negative {what} in database: {value}"),
        source: Box::new(e),
    })
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn incr(&self, key: &str) -> Result<u64, StorageError> {
        let row = sqlx::query(
            "INSERT INTO kv_counters (key, value) VALUES ($1, 1)
             ON CONFLICT (key) DO UPDATE SET value = kv_counters.value + 1
             RETURNING value",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        from_bigint(row.try_get("value")?, "counter")
    }

    async fn put_document(&self, key: &str, doc: &Value) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO kv_documents (key, doc) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET doc = EXCLUDED.doc, updated_at = NOW()",
        )
        .bind(key)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_field(
        &self,
        key: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE kv_documents
             SET doc = jsonb_set(doc, ARRAY[$2::text], $3::jsonb, true), updated_at = NOW()
             WHERE key = $1",
        )
        .bind(key)
        .bind(field)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_document(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let row = sqlx::query("SELECT doc FROM kv_documents WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.try_get::<Value, _>("doc")).transpose()?)
    }

    async fn get_documents(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StorageError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query("SELECT key, doc FROM kv_documents WHERE key = ANY($1)")
            .bind(keys)
            .fetch_all(&self.pool)
            .await?;
        let mut found = HashMap::with_capacity(rows.len());
        for row in &rows {
            let key: String = row.try_get("key")?;
            let doc: Value = row.try_get("doc")?;
            found.insert(key, doc);
        }
        Ok(keys.iter().map(|k| found.remove(k)).collect())
    }

    async fn delete_document(&self, key: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM kv_documents WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_add(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "INSERT INTO kv_sets (set_key, member) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(set)
        .bind(to_member(member)?)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_members(&self, set: &str) -> Result<Vec<u64>, StorageError> {
        let rows = sqlx::query("SELECT member FROM kv_sets WHERE set_key = $1 ORDER BY member")
            .bind(set)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| from_bigint(r.try_get("member")?, "set member")).collect()
    }

    async fn set_remove(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM kv_sets WHERE set_key = $1 AND member = $2")
            .bind(set)
            .bind(to_member(member)?)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
