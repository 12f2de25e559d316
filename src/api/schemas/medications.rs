use crate::api::schemas::RecordView;
use crate::domain::medication::Medication;
use crate::services::inventory_service::EvaluatedMedication;
use serde::{Deserialize, Serialize};

/// A medication with its inventory status attached. Every medication
/// response goes through this type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationView {
    #[serde(flatten)]
    pub record: RecordView<Medication>,
    pub is_low_stock: bool,
    pub is_expiring_soon: bool,
    pub days_until_expiry: i64,
}

impl From<EvaluatedMedication> for MedicationView {
    fn from(evaluated: EvaluatedMedication) -> Self {
        Self {
            record: evaluated.record.into(),
            is_low_stock: evaluated.status.is_low_stock,
            is_expiring_soon: evaluated.status.is_expiring_soon,
            days_until_expiry: evaluated.status.days_until_expiry,
        }
    }
}

#[must_use]
pub fn views(medications: Vec<EvaluatedMedication>) -> Vec<MedicationView> {
    medications.into_iter().map(Into::into).collect()
}

/// Create/replace body. `version`, when sent, must match the stored record.
#[derive(Debug, Deserialize)]
pub struct MedicationWrite {
    #[serde(flatten)]
    pub medication: Medication,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub term: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Scan {
    #[serde(default)]
    pub barcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i64,
}
