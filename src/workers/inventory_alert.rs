use crate::error::Result;
use crate::services::inventory_service::InventoryService;
use opentelemetry::{global, metrics::Gauge};
use std::time::Duration;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    low_stock: Gauge<u64>,
    expiring_soon: Gauge<u64>,
    expired: Gauge<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("pharmacy-server");
        Self {
            low_stock: meter
                .u64_gauge("inventory_low_stock_items")
                .with_description("Medications at or below their reorder level")
                .build(),
            expiring_soon: meter
                .u64_gauge("inventory_expiring_soon_items")
                .with_description("Medications expiring within the configured horizon")
                .build(),
            expired: meter
                .u64_gauge("inventory_expired_items")
                .with_description("Medications already past their expiration date")
                .build(),
        }
    }
}

/// Counts of a single inventory scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSummary {
    pub low_stock: usize,
    pub expiring_soon: usize,
    pub expired: usize,
}

/// Periodically scans the inventory and reports stock that needs attention.
#[derive(Debug)]
pub struct InventoryAlertWorker {
    inventory_service: InventoryService,
    interval_secs: u64,
    metrics: Metrics,
}

impl InventoryAlertWorker {
    #[must_use]
    pub fn new(inventory_service: InventoryService, interval_secs: u64) -> Self {
        Self { inventory_service, interval_secs, metrics: Metrics::new() }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        if self.interval_secs == 0 {
            tracing::info!("Inventory alerts are disabled (interval = 0)");
            return;
        }

        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.scan()
                        .instrument(tracing::info_span!("inventory_alert_iteration"))
                        .await
                    {
                        tracing::error!(error = ?e, "Inventory alert iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Inventory alert loop shutting down...");
    }

    /// Runs one scan, logging and recording what it found.
    ///
    /// # Errors
    /// Returns an error if medications cannot be read.
    #[tracing::instrument(skip(self), err)]
    pub async fn scan(&self) -> Result<AlertSummary> {
        let low_stock = self.inventory_service.low_stock().await?.len();
        let expiring_soon = self.inventory_service.expiring_soon().await?.len();
        let expired = self.inventory_service.list().await?.iter().filter(|m| m.status.is_expired()).count();

        let summary = AlertSummary { low_stock, expiring_soon, expired };

        self.metrics.low_stock.record(low_stock as u64, &[]);
        self.metrics.expiring_soon.record(expiring_soon as u64, &[]);
        self.metrics.expired.record(expired as u64, &[]);

        if low_stock > 0 || expiring_soon > 0 || expired > 0 {
            tracing::warn!(low_stock, expiring_soon, expired, "Inventory needs attention");
        } else {
            tracing::debug!("Inventory scan clean");
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::InventoryConfig;
    use crate::domain::medication::Medication;
    use crate::storage::{DocumentStore, MemoryDocumentStore, Repository};
    use std::sync::Arc;
    use time::macros::datetime;
    use time::{Duration as Days, OffsetDateTime};

    const NOW: OffsetDateTime = datetime!(2025-09-01 09:00 UTC);

    fn medication(name: &str, stock: i64, expires_in_days: i64) -> Medication {
        Medication {
            name: name.into(),
            generic_name: None,
            manufacturer: "Acme".into(),
            category: "General".into(),
            dosage: "500mg".into(),
            form: "Tablet".into(),
            price: 1.0,
            cost_price: 1.0,
            batch_number: "B-1".into(),
            expiration_date: NOW + Days::days(expires_in_days),
            reorder_level: 10,
            current_stock: stock,
            location: None,
            needs_prescription: false,
            barcode: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_scan_counts() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let service = InventoryService::new(
            Repository::new(store),
            Arc::new(ManualClock::new(NOW)),
            InventoryConfig { expiring_horizon_days: 30, alert_interval_secs: 60, stock_retry_attempts: 3 },
        );
        service.create(medication("low", 2, 200)).await.unwrap();
        service.create(medication("soon", 50, 5)).await.unwrap();
        service.create(medication("gone", 50, -3)).await.unwrap();
        service.create(medication("fine", 50, 200)).await.unwrap();

        let worker = InventoryAlertWorker::new(service, 60);
        let summary = worker.scan().await.unwrap();
        assert_eq!(summary, AlertSummary { low_stock: 1, expiring_soon: 1, expired: 1 });
    }

    #[tokio::test]
    async fn test_disabled_worker_returns_immediately() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let service = InventoryService::new(
            Repository::new(store),
            Arc::new(ManualClock::new(NOW)),
            InventoryConfig { expiring_horizon_days: 30, alert_interval_secs: 0, stock_retry_attempts: 3 },
        );
        let (_tx, rx) = tokio::sync::watch::channel(false);
        InventoryAlertWorker::new(service, 0).run(rx).await;
    }
}
