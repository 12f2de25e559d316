use crate::domain::dates;
use crate::domain::line_item::LineItem;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Shipped,
    Delivered,
    Cancelled,
}

/// A purchase order placed with a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: String,
    pub supplier_id: Uuid,
    pub status: OrderStatus,
    #[serde(with = "dates")]
    pub order_date: OffsetDateTime,
    #[serde(default, with = "dates::option", skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<OffsetDateTime>,
    #[serde(default, with = "dates::option", skip_serializing_if = "Option::is_none")]
    pub actual_delivery: Option<OffsetDateTime>,
    pub items: Vec<LineItem>,
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub user_id: Uuid,
}

impl Order {
    /// Moves the order to `status`, stamping the delivery time on first delivery.
    pub fn set_status(&mut self, status: OrderStatus, now: OffsetDateTime) {
        if status == OrderStatus::Delivered && self.actual_delivery.is_none() {
            self.actual_delivery = Some(now);
        }
        self.status = status;
    }
}
