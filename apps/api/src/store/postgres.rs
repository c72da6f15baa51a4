use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{DocKind, DocumentStore, StoreError};

/// Postgres-backed document store. One `documents` table holds every entity
/// as jsonb; `(kind, id)` is the primary key, so upserts are last-writer-wins
/// per key and the per-kind recovery scan is a single filtered select.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, kind: DocKind, id: Uuid) -> Result<Option<Value>, StoreError> {
        let doc: Option<Value> =
            sqlx::query_scalar("SELECT doc FROM documents WHERE kind = $1 AND id = $2")
                .bind(kind.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(doc)
    }

    async fn upsert(&self, kind: DocKind, id: Uuid, doc: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (kind, id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (kind, id)
            DO UPDATE SET doc = EXCLUDED.doc, updated_at = now()
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, kind: DocKind, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_by_field(
        &self,
        kind: DocKind,
        field: &str,
        value: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT doc FROM documents
            WHERE kind = $1 AND doc -> $2 = $3
            ORDER BY created_at
            "#,
        )
        .bind(kind.as_str())
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }
}
