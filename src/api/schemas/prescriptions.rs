use crate::api::schemas::RecordView;
use crate::domain::prescription::Prescription;
use crate::services::prescription_service::PrescriptionCheck;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PrescriptionWrite {
    #[serde(flatten)]
    pub prescription: Prescription,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub prescription_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub prescription: RecordView<Prescription>,
}

impl From<PrescriptionCheck> for Verification {
    fn from(check: PrescriptionCheck) -> Self {
        Self {
            valid: check.verdict.is_valid(),
            reason: check.verdict.reason(),
            prescription: RecordView::from(check.record),
        }
    }
}
