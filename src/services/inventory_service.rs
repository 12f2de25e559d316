use crate::clock::Clock;
use crate::config::InventoryConfig;
use crate::domain::medication::{InventoryStatus, Medication, evaluate, filter_expiring_soon, filter_low_stock};
use crate::error::{AppError, Result};
use crate::storage::{MedicationRepository, Record};
use backon::{ExponentialBuilder, Retryable};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SEARCH_FIELDS: [&str; 3] = ["name", "genericName", "category"];

#[derive(Clone, Debug)]
struct Metrics {
    stock_adjustments_total: Counter<u64>,
    stock_conflicts_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("pharmacy-server");
        Self {
            stock_adjustments_total: meter
                .u64_counter("inventory_stock_adjustments_total")
                .with_description("Stock adjustments applied, by direction")
                .build(),
            stock_conflicts_total: meter
                .u64_counter("inventory_stock_conflicts_total")
                .with_description("Stock adjustments that lost a race and were retried")
                .build(),
        }
    }
}

fn prepare(mut medication: Medication) -> Result<Medication> {
    medication.normalize();
    medication.validate().map_err(AppError::BadRequest)?;
    Ok(medication)
}

/// A medication paired with its inventory status at read time.
#[derive(Debug, Clone)]
pub struct EvaluatedMedication {
    pub record: Record<Medication>,
    pub status: InventoryStatus,
}

#[derive(Clone, Debug)]
pub struct InventoryService {
    medications: MedicationRepository,
    clock: Arc<dyn Clock>,
    config: InventoryConfig,
    metrics: Metrics,
}

impl InventoryService {
    #[must_use]
    pub fn new(medications: MedicationRepository, clock: Arc<dyn Clock>, config: InventoryConfig) -> Self {
        Self { medications, clock, config, metrics: Metrics::new() }
    }

    /// Every medication leaving this service goes through here, so single
    /// fetches and list scans evaluate at the same instant granularity.
    fn evaluate_all(&self, records: Vec<Record<Medication>>) -> Vec<EvaluatedMedication> {
        let now = self.clock.now();
        records
            .into_iter()
            .map(|record| {
                let status = evaluate(&record.data, now);
                EvaluatedMedication { record, status }
            })
            .collect()
    }

    fn evaluate_one(&self, record: Record<Medication>) -> EvaluatedMedication {
        let status = evaluate(&record.data, self.clock.now());
        EvaluatedMedication { record, status }
    }

    #[tracing::instrument(err, skip(self))]
    pub async fn list(&self) -> Result<Vec<EvaluatedMedication>> {
        Ok(self.evaluate_all(self.medications.find_all().await?))
    }

    /// # Errors
    /// `AppError::NotFound` if there is no such medication.
    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<EvaluatedMedication> {
        let record = self.medications.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        Ok(self.evaluate_one(record))
    }

    /// # Errors
    /// `AppError::BadRequest` if the record fails validation, `AppError::Conflict` on a duplicate barcode.
    #[tracing::instrument(err(level = "warn"), skip(self, medication), fields(name = %medication.name))]
    pub async fn create(&self, medication: Medication) -> Result<EvaluatedMedication> {
        let medication = prepare(medication)?;
        let record = self.medications.create(medication).await?;
        tracing::info!(medication_id = %record.id, "Medication created");
        Ok(self.evaluate_one(record))
    }

    /// Replaces a medication. With `expected_version` the write only succeeds if
    /// the record is still at that version.
    ///
    /// # Errors
    /// `AppError::NotFound`, `AppError::BadRequest` or `AppError::Conflict`.
    #[tracing::instrument(err(level = "warn"), skip(self, medication))]
    pub async fn update(&self, id: Uuid, expected_version: Option<i64>, medication: Medication) -> Result<EvaluatedMedication> {
        let medication = prepare(medication)?;
        let current = self.medications.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        let version = expected_version.unwrap_or(current.version);
        let record = self.medications.update(id, version, medication).await?;
        Ok(self.evaluate_one(record))
    }

    /// # Errors
    /// `AppError::NotFound` if there is no such medication.
    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.medications.delete(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(medication_id = %id, "Medication deleted");
        Ok(())
    }

    /// Case-insensitive substring search over name, generic name and category.
    ///
    /// # Errors
    /// `AppError::BadRequest` if the term is blank.
    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn search(&self, term: Option<&str>) -> Result<Vec<EvaluatedMedication>> {
        let term = term.map(str::trim).filter(|t| !t.is_empty()).ok_or_else(|| {
            AppError::BadRequest("Search term is required".into())
        })?;
        Ok(self.evaluate_all(self.medications.search(&SEARCH_FIELDS, term).await?))
    }

    #[tracing::instrument(err, skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<EvaluatedMedication>> {
        let records = filter_low_stock(self.medications.find_all().await?);
        Ok(self.evaluate_all(records))
    }

    /// Unexpired medications whose day count is within the configured horizon.
    #[tracing::instrument(err, skip(self))]
    pub async fn expiring_soon(&self) -> Result<Vec<EvaluatedMedication>> {
        let records =
            filter_expiring_soon(self.medications.find_all().await?, self.clock.now(), self.config.expiring_horizon_days);
        Ok(self.evaluate_all(records))
    }

    /// # Errors
    /// `AppError::BadRequest` if the barcode is blank, `AppError::NotFound` if unknown.
    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn scan(&self, barcode: Option<&str>) -> Result<EvaluatedMedication> {
        let barcode =
            barcode.map(str::trim).filter(|b| !b.is_empty()).ok_or_else(|| AppError::BadRequest("Barcode is required".into()))?;
        let record = self.medications.find_one_by("barcode", barcode).await?.ok_or(AppError::NotFound)?;
        Ok(self.evaluate_one(record))
    }

    /// Adds `delta` (negative to remove) to the current stock. Concurrent
    /// adjustments of the same record are serialized by version checks and
    /// retried.
    ///
    /// # Errors
    /// `AppError::BadRequest` if the result would be negative, `AppError::NotFound`
    /// if the medication does not exist, `AppError::Conflict` if retries run out.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn adjust_stock(&self, id: Uuid, delta: i64) -> Result<EvaluatedMedication> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(5))
            .with_max_delay(Duration::from_millis(200))
            .with_max_times(self.config.stock_retry_attempts)
            .with_jitter();

        let record = (|| async { self.try_adjust_stock(id, delta).await })
            .retry(backoff)
            .when(|e| matches!(e, AppError::Conflict(_)))
            .notify(|_, after| {
                self.metrics.stock_conflicts_total.add(1, &[]);
                tracing::debug!(retry_in = ?after, "Stock adjustment raced another writer");
            })
            .await?;

        let direction = if delta >= 0 { "in" } else { "out" };
        self.metrics.stock_adjustments_total.add(1, &[KeyValue::new("direction", direction)]);
        tracing::info!(current_stock = record.data.current_stock, "Stock adjusted");
        Ok(self.evaluate_one(record))
    }

    async fn try_adjust_stock(&self, id: Uuid, delta: i64) -> Result<Record<Medication>> {
        let current = self.medications.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        let new_stock = current
            .data
            .current_stock
            .checked_add(delta)
            .filter(|s| *s >= 0)
            .ok_or_else(|| AppError::BadRequest("Insufficient stock for this adjustment".into()))?;

        let mut data = current.data;
        data.current_stock = new_stock;
        self.medications.update(id, current.version, data).await
    }
}
