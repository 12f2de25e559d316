use crate::domain::dates;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    #[default]
    Active,
    Filled,
    Expired,
    Cancelled,
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "ACTIVE",
            Self::Filled => "FILLED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// A prescription presented at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub prescription_number: String,
    pub patient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_contact: Option<String>,
    pub doctor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_contact: Option<String>,
    #[serde(with = "dates")]
    pub issue_date: OffsetDateTime,
    #[serde(default, with = "dates::option", skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub status: PrescriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Outcome of checking a prescription at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Still `ACTIVE` but past its expiry date.
    Expired,
    Inactive(PrescriptionStatus),
}

impl Verdict {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn reason(self) -> Option<String> {
        match self {
            Self::Valid => None,
            Self::Expired => Some("Prescription has expired".into()),
            Self::Inactive(status) => Some(format!("Prescription is {status}")),
        }
    }
}

impl Prescription {
    pub fn normalize(&mut self) {
        self.prescription_number = self.prescription_number.trim().to_string();
    }

    /// # Errors
    /// Returns a client-facing message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("prescriptionNumber", &self.prescription_number),
            ("patientName", &self.patient_name),
            ("doctorName", &self.doctor_name),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} is required"));
            }
        }
        if let Some(expiry) = self.expiry_date
            && expiry < self.issue_date
        {
            return Err("expiryDate must not precede issueDate".into());
        }
        Ok(())
    }

    /// A prescription can be dispensed against while it is `ACTIVE` and its
    /// expiry date, if any, has not passed.
    #[must_use]
    pub fn verdict(&self, now: OffsetDateTime) -> Verdict {
        if self.status != PrescriptionStatus::Active {
            return Verdict::Inactive(self.status);
        }
        match self.expiry_date {
            Some(expiry) if expiry < now => Verdict::Expired,
            _ => Verdict::Valid,
        }
    }
}
