use crate::clock::Clock;
use crate::domain::line_item::{LineItem, total_amount};
use crate::domain::order::{Order, OrderStatus};
use crate::error::{AppError, Result};
use crate::services::supplier_service::SupplierService;
use crate::storage::{MedicationRepository, OrderRepository, Record};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// A requested line; the amount is computed when the line is priced.
#[derive(Debug, Clone)]
pub struct LineItemDraft {
    pub medication_id: Uuid,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Validates lines against the catalogue and computes their amounts.
///
/// # Errors
/// `AppError::BadRequest` for an empty list, an out-of-range line or an unknown medication.
pub(crate) async fn price_lines(medications: &MedicationRepository, drafts: Vec<LineItemDraft>) -> Result<Vec<LineItem>> {
    if drafts.is_empty() {
        return Err(AppError::BadRequest("at least one item is required".into()));
    }

    let mut items = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if medications.find_by_id(draft.medication_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("medication {} does not exist", draft.medication_id)));
        }
        items.push(LineItem::new(draft.medication_id, draft.quantity, draft.unit_price).map_err(AppError::BadRequest)?);
    }
    Ok(items)
}

#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order_number: String,
    pub supplier_id: Uuid,
    pub status: Option<OrderStatus>,
    pub order_date: Option<OffsetDateTime>,
    pub expected_delivery: Option<OffsetDateTime>,
    pub items: Vec<LineItemDraft>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OrderService {
    orders: OrderRepository,
    medications: MedicationRepository,
    supplier_service: SupplierService,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    #[must_use]
    pub fn new(
        orders: OrderRepository,
        medications: MedicationRepository,
        supplier_service: SupplierService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { orders, medications, supplier_service, clock }
    }

    #[tracing::instrument(err, skip(self))]
    pub async fn list(&self) -> Result<Vec<Record<Order>>> {
        self.orders.find_all().await
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Record<Order>> {
        self.orders.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Places an order on behalf of `user_id`.
    ///
    /// # Errors
    /// `AppError::BadRequest` for invalid input or an unknown supplier,
    /// `AppError::Conflict` if the order number is taken.
    #[tracing::instrument(err(level = "warn"), skip(self, draft), fields(order_number = %draft.order_number))]
    pub async fn create(&self, user_id: Uuid, draft: OrderDraft) -> Result<Record<Order>> {
        let now = self.clock.now();
        let mut order = Order {
            order_number: String::new(),
            supplier_id: draft.supplier_id,
            status: OrderStatus::Pending,
            order_date: draft.order_date.unwrap_or(now),
            expected_delivery: None,
            actual_delivery: None,
            items: Vec::new(),
            total_amount: 0.0,
            notes: None,
            user_id,
        };
        self.apply(&mut order, draft, now).await?;

        let record = self.orders.create(order).await?;
        tracing::info!(order_id = %record.id, total = record.data.total_amount, "Order placed");
        Ok(record)
    }

    /// Rewrites an order's contents. The placing user and any recorded
    /// delivery time are kept.
    #[tracing::instrument(err(level = "warn"), skip(self, draft))]
    pub async fn update(&self, id: Uuid, expected_version: Option<i64>, draft: OrderDraft) -> Result<Record<Order>> {
        let current = self.get(id).await?;
        let mut order = current.data;
        if let Some(order_date) = draft.order_date {
            order.order_date = order_date;
        }
        self.apply(&mut order, draft, self.clock.now()).await?;
        self.orders.update(id, expected_version.unwrap_or(current.version), order).await
    }

    /// # Errors
    /// `AppError::NotFound` if there is no such order.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<Record<Order>> {
        let current = self.get(id).await?;
        let mut order = current.data;
        order.set_status(status, self.clock.now());
        let record = self.orders.update(id, current.version, order).await?;
        tracing::info!(status = ?status, "Order status changed");
        Ok(record)
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.orders.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn apply(&self, order: &mut Order, draft: OrderDraft, now: OffsetDateTime) -> Result<()> {
        let order_number = draft.order_number.trim();
        if order_number.is_empty() {
            return Err(AppError::BadRequest("orderNumber is required".into()));
        }
        if !self.supplier_service.exists(draft.supplier_id).await? {
            return Err(AppError::BadRequest("Supplier not found".into()));
        }
        let items = price_lines(&self.medications, draft.items).await?;

        order.order_number = order_number.to_string();
        order.supplier_id = draft.supplier_id;
        order.expected_delivery = draft.expected_delivery;
        order.total_amount = total_amount(&items);
        order.items = items;
        order.notes = draft.notes;
        if let Some(status) = draft.status {
            order.set_status(status, now);
        }
        Ok(())
    }
}
