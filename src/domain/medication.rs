use crate::domain::dates;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Records whose expiry falls within this many days count as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 30;

const NANOS_PER_DAY: i128 = 86_400 * 1_000_000_000;

/// A stored medication. Inventory status is never stored; see [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
    pub manufacturer: String,
    pub category: String,
    pub dosage: String,
    pub form: String,
    pub price: f64,
    pub cost_price: f64,
    pub batch_number: String,
    #[serde(with = "dates")]
    pub expiration_date: OffsetDateTime,
    pub reorder_level: i64,
    pub current_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default = "prescription_required")]
    pub needs_prescription: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const fn prescription_required() -> bool {
    true
}

impl Medication {
    /// Canonicalizes client input before validation. Barcodes are matched
    /// exactly on scan, so surrounding whitespace is dropped.
    pub fn normalize(&mut self) {
        if let Some(barcode) = self.barcode.as_mut() {
            let trimmed = barcode.trim();
            if trimmed.len() != barcode.len() {
                *barcode = trimmed.to_string();
            }
        }
    }

    /// Write-time checks. Stock figures must be non-negative and prices finite.
    ///
    /// # Errors
    /// Returns a client-facing message describing the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("name", &self.name),
            ("manufacturer", &self.manufacturer),
            ("category", &self.category),
            ("dosage", &self.dosage),
            ("form", &self.form),
            ("batchNumber", &self.batch_number),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{field} is required"));
            }
        }
        if self.current_stock < 0 {
            return Err("currentStock must not be negative".into());
        }
        if self.reorder_level < 0 {
            return Err("reorderLevel must not be negative".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("price must be a non-negative number".into());
        }
        if !self.cost_price.is_finite() || self.cost_price < 0.0 {
            return Err("costPrice must be a non-negative number".into());
        }
        if self.barcode.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err("barcode must not be blank".into());
        }
        Ok(())
    }
}

/// Derived inventory state of a medication at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryStatus {
    pub is_low_stock: bool,
    pub is_expiring_soon: bool,
    /// Whole days until expiry, rounded up. Zero or negative once expired.
    pub days_until_expiry: i64,
}

impl InventoryStatus {
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.days_until_expiry <= 0
    }
}

/// Computes the derived state of `record` as of `now`.
///
/// Low stock includes the tie `currentStock == reorderLevel`. Expiring soon
/// is `ceil((expirationDate - now) / 1 day) <= 30` and so also covers records
/// that have already expired.
#[must_use]
pub fn evaluate(record: &Medication, now: OffsetDateTime) -> InventoryStatus {
    let days_until_expiry = days_until(record.expiration_date, now);
    InventoryStatus {
        is_low_stock: record.current_stock <= record.reorder_level,
        is_expiring_soon: days_until_expiry <= EXPIRING_SOON_DAYS,
        days_until_expiry,
    }
}

fn days_until(expiration: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let nanos = (expiration - now).whole_nanoseconds();
    // Integer division truncates toward zero, which is already the ceiling for negatives.
    let days = if nanos > 0 && nanos % NANOS_PER_DAY != 0 { nanos / NANOS_PER_DAY + 1 } else { nanos / NANOS_PER_DAY };
    i64::try_from(days).unwrap_or(if days < 0 { i64::MIN } else { i64::MAX })
}

/// Keeps the records that are at or below their reorder level, in input order.
pub fn filter_low_stock<T: AsRef<Medication>>(records: Vec<T>) -> Vec<T> {
    records.into_iter().filter(|r| r.as_ref().current_stock <= r.as_ref().reorder_level).collect()
}

/// Keeps the records that have not expired yet and whose
/// [`InventoryStatus::days_until_expiry`] is at most `horizon_days`.
/// Input order is preserved.
///
/// Membership uses the same day count as [`evaluate`], so with a horizon of
/// at most [`EXPIRING_SOON_DAYS`] every kept record is flagged expiring soon.
pub fn filter_expiring_soon<T: AsRef<Medication>>(records: Vec<T>, as_of: OffsetDateTime, horizon_days: i64) -> Vec<T> {
    records
        .into_iter()
        .filter(|r| {
            let expires = r.as_ref().expiration_date;
            expires >= as_of && days_until(expires, as_of) <= horizon_days
        })
        .collect()
}

impl AsRef<Self> for Medication {
    fn as_ref(&self) -> &Self {
        self
    }
}
