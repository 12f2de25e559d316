use crate::domain::dates;
use crate::domain::line_item::LineItem;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Sale,
    Return,
    Adjustment,
    Expiry,
}

/// A recorded stock movement (sale, return, manual adjustment or write-off).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(with = "dates")]
    pub date: OffsetDateTime,
    pub total_amount: f64,
    pub user_id: Uuid,
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
