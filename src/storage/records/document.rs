use crate::storage::Document;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct DocumentRecord {
    pub id: Uuid,
    pub version: i64,
    pub body: Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            version: record.version,
            body: record.body,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
