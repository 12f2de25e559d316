use crate::clock::Clock;
use crate::domain::line_item::total_amount;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{AppError, Result};
use crate::services::order_service::{LineItemDraft, price_lines};
use crate::storage::{MedicationRepository, Record, TransactionRepository};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub kind: TransactionType,
    pub date: Option<OffsetDateTime>,
    pub items: Vec<LineItemDraft>,
    pub notes: Option<String>,
}

/// Ledger of stock movements. Recording a transaction does not touch
/// medication stock levels; those move through explicit stock adjustments.
#[derive(Clone, Debug)]
pub struct TransactionService {
    transactions: TransactionRepository,
    medications: MedicationRepository,
    clock: Arc<dyn Clock>,
}

impl TransactionService {
    #[must_use]
    pub fn new(transactions: TransactionRepository, medications: MedicationRepository, clock: Arc<dyn Clock>) -> Self {
        Self { transactions, medications, clock }
    }

    #[tracing::instrument(err, skip(self))]
    pub async fn list(&self) -> Result<Vec<Record<Transaction>>> {
        self.transactions.find_all().await
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Record<Transaction>> {
        self.transactions.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    #[tracing::instrument(err(level = "warn"), skip(self, draft), fields(kind = ?draft.kind))]
    pub async fn create(&self, user_id: Uuid, draft: TransactionDraft) -> Result<Record<Transaction>> {
        let items = price_lines(&self.medications, draft.items).await?;
        let transaction = Transaction {
            kind: draft.kind,
            date: draft.date.unwrap_or_else(|| self.clock.now()),
            total_amount: total_amount(&items),
            user_id,
            items,
            notes: draft.notes,
        };

        let record = self.transactions.create(transaction).await?;
        tracing::info!(transaction_id = %record.id, "Transaction recorded");
        Ok(record)
    }

    /// Rewrites a transaction. The recording user is kept.
    #[tracing::instrument(err(level = "warn"), skip(self, draft))]
    pub async fn update(
        &self,
        id: Uuid,
        expected_version: Option<i64>,
        draft: TransactionDraft,
    ) -> Result<Record<Transaction>> {
        let current = self.get(id).await?;
        let items = price_lines(&self.medications, draft.items).await?;

        let mut transaction = current.data;
        transaction.kind = draft.kind;
        if let Some(date) = draft.date {
            transaction.date = date;
        }
        transaction.total_amount = total_amount(&items);
        transaction.items = items;
        transaction.notes = draft.notes;

        self.transactions.update(id, expected_version.unwrap_or(current.version), transaction).await
    }

    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.transactions.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
