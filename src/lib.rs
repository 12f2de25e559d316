#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use crate::api::ServiceContainer;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use crate::services::inventory_service::InventoryService;
use crate::services::order_service::OrderService;
use crate::services::prescription_service::PrescriptionService;
use crate::services::rate_limit_service::RateLimitService;
use crate::services::supplier_service::SupplierService;
use crate::services::transaction_service::TransactionService;
use crate::storage::{DbPool, DocumentStore, MemoryDocumentStore, PgDocumentStore, Repository};
use crate::workers::InventoryAlertWorker;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub mod api;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod storage;
pub mod telemetry;
pub mod workers;

/// Background tasks, spawned once the listeners are up.
#[derive(Debug)]
pub struct Workers {
    inventory_alert: InventoryAlertWorker,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![tokio::spawn(self.inventory_alert.run(shutdown_rx))]
    }
}

#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
    pub workers: Workers,
}

/// Wires storage, clock and services into an [`App`].
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    store: Option<Arc<dyn DocumentStore>>,
    clock: Arc<dyn Clock>,
}

impl AppBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, store: None, clock: Arc::new(SystemClock) }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds every service and creates the bootstrap administrator if configured.
    ///
    /// # Errors
    /// Returns an error if the bootstrap administrator cannot be created.
    pub async fn build(self) -> anyhow::Result<App> {
        let store = self.store.unwrap_or_else(|| {
            tracing::warn!("No database configured; using the in-memory document store");
            Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>
        });
        let config = self.config;

        let users = Repository::new(Arc::clone(&store));
        let medications = Repository::new(Arc::clone(&store));

        let auth_service = AuthService::new(config.auth.clone(), users.clone(), Arc::clone(&self.clock));
        let account_service = AccountService::new(users, auth_service.clone());
        let inventory_service =
            InventoryService::new(medications.clone(), Arc::clone(&self.clock), config.inventory.clone());
        let supplier_service = SupplierService::new(Repository::new(Arc::clone(&store)));
        let order_service = OrderService::new(
            Repository::new(Arc::clone(&store)),
            medications.clone(),
            supplier_service.clone(),
            Arc::clone(&self.clock),
        );
        let transaction_service =
            TransactionService::new(Repository::new(Arc::clone(&store)), medications, Arc::clone(&self.clock));
        let prescription_service =
            PrescriptionService::new(Repository::new(Arc::clone(&store)), Arc::clone(&self.clock));
        let rate_limit_service = RateLimitService::new(config.server.trusted_proxies.clone());
        let health_service = HealthService::new(store, config.health.clone());

        if let (Some(email), Some(password)) =
            (&config.auth.bootstrap_admin_email, &config.auth.bootstrap_admin_password)
        {
            account_service.ensure_admin(&config.auth.bootstrap_admin_name, email, password).await?;
        }

        let workers = Workers {
            inventory_alert: InventoryAlertWorker::new(inventory_service.clone(), config.inventory.alert_interval_secs),
        };

        Ok(App {
            services: ServiceContainer {
                auth_service,
                account_service,
                inventory_service,
                supplier_service,
                order_service,
                transaction_service,
                prescription_service,
                rate_limit_service,
            },
            health_service,
            workers,
        })
    }
}

/// Connects to Postgres and applies migrations.
///
/// # Errors
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_database(database_url: &str, config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let pool = storage::init_pool(database_url, &config.database).await?;
    run_migrations(&pool).await?;
    Ok(Arc::new(PgDocumentStore::new(pool)))
}

/// # Errors
/// Returns an error if a migration fails.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Routes panics through tracing so they reach the configured log output.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        tracing::error!(panic.location = %location, panic.payload = %payload, "Panic occurred");
    }));
}

/// Flips `shutdown_tx` on Ctrl+C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            () = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}
