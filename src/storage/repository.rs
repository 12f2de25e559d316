use crate::domain::medication::Medication;
use crate::domain::order::Order;
use crate::domain::prescription::Prescription;
use crate::domain::supplier::Supplier;
use crate::domain::transaction::Transaction;
use crate::domain::user::User;
use crate::error::Result;
use crate::storage::{Collection, Document, DocumentStore};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// A domain type persisted in a fixed collection.
pub trait Stored: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
}

impl Stored for User {
    const COLLECTION: Collection = Collection::Users;
}

impl Stored for Medication {
    const COLLECTION: Collection = Collection::Medications;
}

impl Stored for Supplier {
    const COLLECTION: Collection = Collection::Suppliers;
}

impl Stored for Order {
    const COLLECTION: Collection = Collection::Orders;
}

impl Stored for Transaction {
    const COLLECTION: Collection = Collection::Transactions;
}

impl Stored for Prescription {
    const COLLECTION: Collection = Collection::Prescriptions;
}

pub type AccountRepository = Repository<User>;
pub type MedicationRepository = Repository<Medication>;
pub type SupplierRepository = Repository<Supplier>;
pub type OrderRepository = Repository<Order>;
pub type TransactionRepository = Repository<Transaction>;
pub type PrescriptionRepository = Repository<Prescription>;

/// A typed document together with its store metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: Uuid,
    pub version: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub data: T,
}

impl<T> AsRef<T> for Record<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T: Stored> TryFrom<Document> for Record<T> {
    type Error = serde_json::Error;

    fn try_from(doc: Document) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: doc.id,
            version: doc.version,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            data: serde_json::from_value(doc.body)?,
        })
    }
}

/// Typed access to one collection of a [`DocumentStore`].
///
/// A stored document that no longer deserializes into `T` is reported as
/// `AppError::Serialization` rather than skipped.
#[derive(Debug)]
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), _marker: PhantomData }
    }
}

impl<T: Stored> Repository<T> {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, _marker: PhantomData }
    }

    fn decode(doc: Document) -> Result<Record<T>> {
        Ok(Record::try_from(doc)?)
    }

    fn decode_all(docs: Vec<Document>) -> Result<Vec<Record<T>>> {
        docs.into_iter().map(Self::decode).collect()
    }

    pub async fn find_all(&self) -> Result<Vec<Record<T>>> {
        Self::decode_all(self.store.find_all(T::COLLECTION).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Record<T>>> {
        self.store.find_by_id(T::COLLECTION, id).await?.map(Self::decode).transpose()
    }

    pub async fn find_one_by(&self, field: &str, value: &str) -> Result<Option<Record<T>>> {
        self.store.find_one_by(T::COLLECTION, field, value).await?.map(Self::decode).transpose()
    }

    pub async fn search(&self, fields: &[&str], term: &str) -> Result<Vec<Record<T>>> {
        Self::decode_all(self.store.search(T::COLLECTION, fields, term).await?)
    }

    pub async fn create(&self, data: T) -> Result<Record<T>> {
        let body = serde_json::to_value(&data)?;
        let doc = self.store.insert(T::COLLECTION, Uuid::new_v4(), body).await?;
        Self::decode(doc)
    }

    /// Writes `data` over the record, provided nobody has written since `expected_version`.
    pub async fn update(&self, id: Uuid, expected_version: i64, data: T) -> Result<Record<T>> {
        let body = serde_json::to_value(&data)?;
        let doc = self.store.replace(T::COLLECTION, id, expected_version, body).await?;
        Self::decode(doc)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.store.delete(T::COLLECTION, id).await
    }
}
