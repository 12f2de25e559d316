use crate::error::{AppError, Result};
use crate::storage::{Collection, Document, DocumentStore, VERSION_CONFLICT};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Process-local document store. Each collection is a vector in insertion
/// order behind its own shard lock, so unique checks and writes within a
/// collection are atomic.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<Collection, Vec<Document>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn string_field<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}

fn violates_unique(collection: Collection, docs: &[Document], id: Uuid, body: &Value) -> bool {
    let Some(field) = collection.unique_field() else {
        return false;
    };
    let Some(value) = string_field(body, field) else {
        return false;
    };
    docs.iter().any(|d| d.id != id && string_field(&d.body, field) == Some(value))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>> {
        Ok(self.collections.get(&collection).map(|docs| docs.value().clone()).unwrap_or_default())
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>> {
        Ok(self.collections.get(&collection).and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn find_one_by(&self, collection: Collection, field: &str, value: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| string_field(&d.body, field) == Some(value)).cloned()))
    }

    async fn search(&self, collection: Collection, fields: &[&str], term: &str) -> Result<Vec<Document>> {
        let needle = term.to_lowercase();
        Ok(self
            .collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| {
                        fields.iter().any(|f| string_field(&d.body, f).is_some_and(|v| v.to_lowercase().contains(&needle)))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, id: Uuid, body: Value) -> Result<Document> {
        let mut docs = self.collections.entry(collection).or_default();
        if docs.iter().any(|d| d.id == id) || violates_unique(collection, &docs, id, &body) {
            return Err(AppError::Conflict(collection.conflict_message()));
        }

        let now = OffsetDateTime::now_utc();
        let doc = Document { id, version: 1, body, created_at: now, updated_at: now };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn replace(&self, collection: Collection, id: Uuid, expected_version: i64, body: Value) -> Result<Document> {
        let mut docs = self.collections.entry(collection).or_default();
        let unique_violation = violates_unique(collection, &docs, id, &body);

        let doc = docs.iter_mut().find(|d| d.id == id).ok_or(AppError::NotFound)?;
        if doc.version != expected_version {
            return Err(AppError::Conflict(VERSION_CONFLICT.into()));
        }
        if unique_violation {
            return Err(AppError::Conflict(collection.conflict_message()));
        }

        doc.body = body;
        doc.version += 1;
        doc.updated_at = OffsetDateTime::now_utc();
        Ok(doc.clone())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let Some(mut docs) = self.collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insertion_order_and_search() {
        let store = MemoryDocumentStore::new();
        for name in ["Amoxicillin", "Ibuprofen", "amoxicillin clavulanate"] {
            store.insert(Collection::Medications, Uuid::new_v4(), json!({ "name": name })).await.unwrap();
        }

        let all = store.find_all(Collection::Medications).await.unwrap();
        let names: Vec<_> = all.iter().map(|d| d.body["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["Amoxicillin", "Ibuprofen", "amoxicillin clavulanate"]);

        let hits = store.search(Collection::Medications, &["name"], "AMOXI").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(store.find_all(Collection::Suppliers).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unique_field() {
        let store = MemoryDocumentStore::new();
        store.insert(Collection::Users, Uuid::new_v4(), json!({ "email": "a@x.com" })).await.unwrap();

        let dup = store.insert(Collection::Users, Uuid::new_v4(), json!({ "email": "a@x.com" })).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        // Null barcodes never collide.
        store.insert(Collection::Medications, Uuid::new_v4(), json!({ "barcode": null })).await.unwrap();
        store.insert(Collection::Medications, Uuid::new_v4(), json!({ "barcode": null })).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_checks_version() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        let doc = store.insert(Collection::Suppliers, id, json!({ "name": "A" })).await.unwrap();
        assert_eq!(doc.version, 1);

        let updated = store.replace(Collection::Suppliers, id, 1, json!({ "name": "B" })).await.unwrap();
        assert_eq!(updated.version, 2);

        let stale = store.replace(Collection::Suppliers, id, 1, json!({ "name": "C" })).await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));

        let missing = store.replace(Collection::Suppliers, Uuid::new_v4(), 1, json!({})).await;
        assert!(matches!(missing, Err(AppError::NotFound)));

        assert!(store.delete(Collection::Suppliers, id).await.unwrap());
        assert!(!store.delete(Collection::Suppliers, id).await.unwrap());
    }
}
