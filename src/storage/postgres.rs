use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::storage::records::DocumentRecord;
use crate::storage::{Collection, Document, DocumentStore, VERSION_CONFLICT};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use uuid::Uuid;

pub type DbPool = Pool<Postgres>;

/// Initializes the database connection pool.
///
/// # Errors
/// Returns `sqlx::Error` if the connection fails.
pub async fn init_pool(database_url: &str, config: &DatabaseConfig) -> std::result::Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

const COLUMNS: &str = "id, version, body, created_at, updated_at";

/// Documents stored as JSONB rows of a single `documents` table.
#[derive(Clone, Debug)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_unique_violation(e: sqlx::Error, collection: Collection) -> AppError {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.code().as_deref() == Some("23505")
        {
            return AppError::Conflict(collection.conflict_message());
        }
        AppError::Database(e)
    }
}

/// Escapes `LIKE` wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>> {
        let rows: Vec<DocumentRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM documents WHERE collection = $1 ORDER BY seq"))
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>> {
        let row: Option<DocumentRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2"))
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self, value), err)]
    async fn find_one_by(&self, collection: Collection, field: &str, value: &str) -> Result<Option<Document>> {
        let row: Option<DocumentRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND body->>$2 = $3 ORDER BY seq LIMIT 1"
        ))
        .bind(collection.as_str())
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn search(&self, collection: Collection, fields: &[&str], term: &str) -> Result<Vec<Document>> {
        let fields: Vec<String> = fields.iter().map(ToString::to_string).collect();
        let rows: Vec<DocumentRecord> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM documents
            WHERE collection = $1
              AND EXISTS (SELECT 1 FROM unnest($2::text[]) AS f(name) WHERE body->>f.name ILIKE $3)
            ORDER BY seq
            "#
        ))
        .bind(collection.as_str())
        .bind(fields)
        .bind(like_pattern(term))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self, body), err)]
    async fn insert(&self, collection: Collection, id: Uuid, body: Value) -> Result<Document> {
        let row: DocumentRecord = sqlx::query_as(&format!(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, collection))?;
        Ok(row.into())
    }

    #[tracing::instrument(level = "debug", skip(self, body), err)]
    async fn replace(&self, collection: Collection, id: Uuid, expected_version: i64, body: Value) -> Result<Document> {
        let row: Option<DocumentRecord> = sqlx::query_as(&format!(
            r#"
            UPDATE documents
            SET body = $4, version = version + 1, updated_at = NOW()
            WHERE collection = $1 AND id = $2 AND version = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(expected_version)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, collection))?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        // Nothing matched: either the document is gone or someone else wrote first.
        match self.find_by_id(collection, id).await? {
            Some(_) => Err(AppError::Conflict(VERSION_CONFLICT.into())),
            None => Err(AppError::NotFound),
        }
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
