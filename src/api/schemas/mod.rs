use crate::storage::Record;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod auth;
pub mod health;
pub mod inventory;
pub mod medications;
pub mod prescriptions;
pub mod users;

/// A stored record as sent to clients: its fields plus store metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView<T> {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: T,
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl<T> From<Record<T>> for RecordView<T> {
    fn from(record: Record<T>) -> Self {
        Self {
            id: record.id,
            data: record.data,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: String,
}

impl Acknowledgement {
    pub fn new(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}
