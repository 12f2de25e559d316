use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One medication line on an order or a transaction. `amount` is always
/// `quantity * unit_price`, computed on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub medication_id: Uuid,
    pub quantity: i64,
    pub unit_price: f64,
    pub amount: f64,
}

impl LineItem {
    /// # Errors
    /// Returns a client-facing message if the quantity or price is out of range.
    pub fn new(medication_id: Uuid, quantity: i64, unit_price: f64) -> Result<Self, String> {
        if quantity <= 0 {
            return Err("item quantity must be positive".into());
        }
        if !unit_price.is_finite() || unit_price < 0.0 {
            return Err("item unitPrice must be a non-negative number".into());
        }
        #[allow(clippy::cast_precision_loss)]
        let amount = quantity as f64 * unit_price;
        Ok(Self { medication_id, quantity, unit_price, amount })
    }
}

#[must_use]
pub fn total_amount(items: &[LineItem]) -> f64 {
    items.iter().map(|i| i.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts_are_computed() {
        let items = vec![
            LineItem::new(Uuid::new_v4(), 3, 2.5).unwrap(),
            LineItem::new(Uuid::new_v4(), 1, 10.0).unwrap(),
        ];
        assert!((items[0].amount - 7.5).abs() < f64::EPSILON);
        assert!((total_amount(&items) - 17.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(LineItem::new(Uuid::new_v4(), 0, 1.0).is_err());
        assert!(LineItem::new(Uuid::new_v4(), 2, -1.0).is_err());
        assert!(LineItem::new(Uuid::new_v4(), 2, f64::INFINITY).is_err());
    }
}
