use crate::clock::Clock;
use crate::domain::prescription::{Prescription, Verdict};
use crate::error::{AppError, Result};
use crate::storage::{PrescriptionRepository, Record};
use std::sync::Arc;
use uuid::Uuid;

/// A stored prescription and whether it can be dispensed against right now.
#[derive(Debug, Clone)]
pub struct PrescriptionCheck {
    pub record: Record<Prescription>,
    pub verdict: Verdict,
}

#[derive(Clone, Debug)]
pub struct PrescriptionService {
    prescriptions: PrescriptionRepository,
    clock: Arc<dyn Clock>,
}

fn prepare(mut prescription: Prescription) -> Result<Prescription> {
    prescription.normalize();
    prescription.validate().map_err(AppError::BadRequest)?;
    Ok(prescription)
}

impl PrescriptionService {
    #[must_use]
    pub fn new(prescriptions: PrescriptionRepository, clock: Arc<dyn Clock>) -> Self {
        Self { prescriptions, clock }
    }

    #[tracing::instrument(err, skip(self))]
    pub async fn list(&self) -> Result<Vec<Record<Prescription>>> {
        self.prescriptions.find_all().await
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Record<Prescription>> {
        self.prescriptions.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// # Errors
    /// `AppError::BadRequest` on a blank required field, `AppError::Conflict`
    /// if the prescription number is taken.
    #[tracing::instrument(err(level = "warn"), skip(self, prescription))]
    pub async fn create(&self, prescription: Prescription) -> Result<Record<Prescription>> {
        let record = self.prescriptions.create(prepare(prescription)?).await?;
        tracing::info!(prescription_id = %record.id, "Prescription created");
        Ok(record)
    }

    #[tracing::instrument(err(level = "warn"), skip(self, prescription))]
    pub async fn update(
        &self,
        id: Uuid,
        expected_version: Option<i64>,
        prescription: Prescription,
    ) -> Result<Record<Prescription>> {
        let prescription = prepare(prescription)?;
        let current = self.get(id).await?;
        self.prescriptions.update(id, expected_version.unwrap_or(current.version), prescription).await
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.prescriptions.delete(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(prescription_id = %id, "Prescription deleted");
        Ok(())
    }

    /// Looks a prescription up by number and checks it against the clock.
    ///
    /// # Errors
    /// `AppError::BadRequest` for a blank number, `AppError::NotFound` if no
    /// prescription carries it.
    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn verify(&self, number: &str) -> Result<PrescriptionCheck> {
        let number = number.trim();
        if number.is_empty() {
            return Err(AppError::BadRequest("prescriptionNumber is required".into()));
        }
        let record =
            self.prescriptions.find_one_by("prescriptionNumber", number).await?.ok_or(AppError::NotFound)?;
        let verdict = record.data.verdict(self.clock.now());
        tracing::debug!(prescription_id = %record.id, valid = verdict.is_valid(), "Prescription verified");
        Ok(PrescriptionCheck { record, verdict })
    }
}
