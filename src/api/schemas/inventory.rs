//! Request bodies for suppliers, orders and transactions.

use crate::domain::dates;
use crate::domain::order::OrderStatus;
use crate::domain::supplier::Supplier;
use crate::domain::transaction::TransactionType;
use crate::services::order_service::{LineItemDraft, OrderDraft};
use crate::services::transaction_service::TransactionDraft;
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SupplierWrite {
    #[serde(flatten)]
    pub supplier: Supplier,
    #[serde(default)]
    pub version: Option<i64>,
}

/// Client-supplied line. Any `amount` sent is ignored and recomputed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub medication_id: Uuid,
    pub quantity: i64,
    pub unit_price: f64,
}

impl From<LineItemInput> for LineItemDraft {
    fn from(line: LineItemInput) -> Self {
        Self { medication_id: line.medication_id, quantity: line.quantity, unit_price: line.unit_price }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWrite {
    pub order_number: String,
    pub supplier_id: Uuid,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, with = "dates::option")]
    pub order_date: Option<OffsetDateTime>,
    #[serde(default, with = "dates::option")]
    pub expected_delivery: Option<OffsetDateTime>,
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
}

impl OrderWrite {
    pub fn into_parts(self) -> (OrderDraft, Option<i64>) {
        let draft = OrderDraft {
            order_number: self.order_number,
            supplier_id: self.supplier_id,
            status: self.status,
            order_date: self.order_date,
            expected_delivery: self.expected_delivery,
            items: self.items.into_iter().map(Into::into).collect(),
            notes: self.notes,
        };
        (draft, self.version)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWrite {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default, with = "dates::option")]
    pub date: Option<OffsetDateTime>,
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
}

impl TransactionWrite {
    pub fn into_parts(self) -> (TransactionDraft, Option<i64>) {
        let draft = TransactionDraft {
            kind: self.kind,
            date: self.date,
            items: self.items.into_iter().map(Into::into).collect(),
            notes: self.notes,
        };
        (draft, self.version)
    }
}
