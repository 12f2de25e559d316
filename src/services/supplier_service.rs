use crate::domain::supplier::Supplier;
use crate::error::{AppError, Result};
use crate::storage::{Record, SupplierRepository};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct SupplierService {
    suppliers: SupplierRepository,
}

impl SupplierService {
    #[must_use]
    pub const fn new(suppliers: SupplierRepository) -> Self {
        Self { suppliers }
    }

    #[tracing::instrument(err, skip(self))]
    pub async fn list(&self) -> Result<Vec<Record<Supplier>>> {
        self.suppliers.find_all().await
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Record<Supplier>> {
        self.suppliers.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// # Errors
    /// `AppError::BadRequest` if a required field is blank.
    #[tracing::instrument(err(level = "warn"), skip(self, supplier), fields(name = %supplier.name))]
    pub async fn create(&self, supplier: Supplier) -> Result<Record<Supplier>> {
        supplier.validate().map_err(AppError::BadRequest)?;
        let record = self.suppliers.create(supplier).await?;
        tracing::info!(supplier_id = %record.id, "Supplier created");
        Ok(record)
    }

    #[tracing::instrument(err(level = "warn"), skip(self, supplier))]
    pub async fn update(&self, id: Uuid, expected_version: Option<i64>, supplier: Supplier) -> Result<Record<Supplier>> {
        supplier.validate().map_err(AppError::BadRequest)?;
        let current = self.get(id).await?;
        self.suppliers.update(id, expected_version.unwrap_or(current.version), supplier).await
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.suppliers.delete(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(supplier_id = %id, "Supplier deleted");
        Ok(())
    }

    pub(crate) async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.suppliers.find_by_id(id).await?.is_some())
    }
}
