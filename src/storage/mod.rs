use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;
pub mod records;
pub mod repository;

pub use memory::MemoryDocumentStore;
pub use postgres::{DbPool, PgDocumentStore, init_pool};
pub use repository::{
    AccountRepository, MedicationRepository, OrderRepository, PrescriptionRepository, Record, Repository, Stored,
    SupplierRepository, TransactionRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Medications,
    Suppliers,
    Orders,
    Transactions,
    Prescriptions,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Medications => "medications",
            Self::Suppliers => "suppliers",
            Self::Orders => "orders",
            Self::Transactions => "transactions",
            Self::Prescriptions => "prescriptions",
        }
    }

    /// Top-level body field that must be unique within the collection, if any.
    /// Documents where the field is absent or null are exempt.
    #[must_use]
    pub const fn unique_field(self) -> Option<&'static str> {
        match self {
            Self::Users => Some("email"),
            Self::Medications => Some("barcode"),
            Self::Orders => Some("orderNumber"),
            Self::Prescriptions => Some("prescriptionNumber"),
            Self::Suppliers | Self::Transactions => None,
        }
    }

    #[must_use]
    pub(crate) fn conflict_message(self) -> String {
        self.unique_field().map_or_else(|| "Document already exists".to_string(), |f| format!("{f} already exists"))
    }
}

/// A JSON document plus the metadata the store maintains for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    /// Incremented on every successful replace; used for optimistic concurrency.
    pub version: i64,
    pub body: Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A collection-oriented document store. Listings return documents in
/// insertion order.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>>;

    /// Exact match on a top-level string field.
    async fn find_one_by(&self, collection: Collection, field: &str, value: &str) -> Result<Option<Document>>;

    /// Case-insensitive substring match of `term` against any of `fields`.
    async fn search(&self, collection: Collection, fields: &[&str], term: &str) -> Result<Vec<Document>>;

    /// # Errors
    /// `AppError::Conflict` if the collection's unique field is already taken.
    async fn insert(&self, collection: Collection, id: Uuid, body: Value) -> Result<Document>;

    /// Replaces the body if the stored version still equals `expected_version`.
    ///
    /// # Errors
    /// `AppError::NotFound` if the document is gone, `AppError::Conflict` if the
    /// version moved on or the unique field collides.
    async fn replace(&self, collection: Collection, id: Uuid, expected_version: i64, body: Value) -> Result<Document>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

pub(crate) const VERSION_CONFLICT: &str = "Document was modified concurrently";
