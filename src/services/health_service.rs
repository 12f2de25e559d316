use crate::config::HealthConfig;
use crate::storage::DocumentStore;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
pub struct Metrics {
    pub status: Gauge<i64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("pharmacy-server");
        Self {
            status: meter
                .i64_gauge("pharmacy_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    store: Arc<dyn DocumentStore>,
    config: HealthConfig,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: HealthConfig) -> Self {
        Self { store, config, metrics: Metrics::new() }
    }

    /// Checks that the document store answers within the configured timeout.
    ///
    /// # Errors
    /// Returns a string describing the failure if the store is unreachable.
    pub async fn check_db(&self) -> Result<(), String> {
        let db_timeout = Duration::from_millis(self.config.db_timeout_ms);

        let result = match timeout(db_timeout, self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("Database connection failed: {e:?}")),
            Err(_) => Err("Database connection timed out".to_string()),
        };

        let up = i64::from(result.is_ok());
        self.metrics.status.record(up, &[KeyValue::new("component", "database")]);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDocumentStore;

    #[tokio::test]
    async fn test_memory_store_is_healthy() {
        let svc = HealthService::new(Arc::new(MemoryDocumentStore::new()), HealthConfig { db_timeout_ms: 100 });
        assert!(svc.check_db().await.is_ok());
    }
}
