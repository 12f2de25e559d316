use crate::api::rate_limit::log_rate_limit_events;
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
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod health;
pub mod medications;
pub mod middleware;
pub mod orders;
pub mod prescriptions;
pub mod rate_limit;
pub mod schemas;
pub mod suppliers;
pub mod transactions;
pub mod users;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub account_service: AccountService,
    pub inventory_service: InventoryService,
    pub supplier_service: SupplierService,
    pub order_service: OrderService,
    pub transaction_service: TransactionService,
    pub prescription_service: PrescriptionService,
    pub rate_limit_service: RateLimitService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub auth_service: AuthService,
    pub account_service: AccountService,
    pub inventory_service: InventoryService,
    pub supplier_service: SupplierService,
    pub order_service: OrderService,
    pub transaction_service: TransactionService,
    pub prescription_service: PrescriptionService,
    pub rate_limit_service: RateLimitService,
}

/// Configures and returns the primary application router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let std_interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(std_interval_ns))
            .burst_size(config.rate_limit.burst)
            .key_extractor(services.rate_limit_service.key.clone())
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Stricter tier for credential checks
    let auth_interval_ns = 1_000_000_000 / config.rate_limit.auth_per_second.max(1);
    let auth_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(auth_interval_ns))
            .burst_size(config.rate_limit.auth_burst)
            .key_extractor(services.rate_limit_service.key.clone())
            .finish()
            .expect("Failed to build auth rate limiter config"),
    );

    let state = AppState {
        config,
        auth_service: services.auth_service,
        account_service: services.account_service,
        inventory_service: services.inventory_service,
        supplier_service: services.supplier_service,
        order_service: services.order_service,
        transaction_service: services.transaction_service,
        prescription_service: services.prescription_service,
        rate_limit_service: services.rate_limit_service,
    };

    let credential_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .layer(GovernorLayer::new(auth_conf));

    let api_routes = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/password", put(auth::change_password))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}/role", put(users::change_role))
        .route("/medications", get(medications::list_medications).post(medications::create_medication))
        .route("/medications/search", get(medications::search_medications))
        .route("/medications/low-stock", get(medications::low_stock))
        .route("/medications/expiring-soon", get(medications::expiring_soon))
        .route("/medications/scan", post(medications::scan))
        .route(
            "/medications/{id}",
            get(medications::get_medication)
                .put(medications::update_medication)
                .delete(medications::delete_medication),
        )
        .route("/medications/{id}/stock", post(medications::adjust_stock))
        .route("/suppliers", get(suppliers::list_suppliers).post(suppliers::create_supplier))
        .route(
            "/suppliers/{id}",
            get(suppliers::get_supplier).put(suppliers::update_supplier).delete(suppliers::delete_supplier),
        )
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/{id}", get(orders::get_order).put(orders::update_order).delete(orders::delete_order))
        .route("/orders/{id}/status", patch(orders::change_status))
        .route("/transactions", get(transactions::list_transactions).post(transactions::create_transaction))
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/prescriptions",
            get(prescriptions::list_prescriptions).post(prescriptions::create_prescription),
        )
        .route("/prescriptions/verify", post(prescriptions::verify_prescription))
        .route(
            "/prescriptions/{id}",
            get(prescriptions::get_prescription)
                .put(prescriptions::update_prescription)
                .delete(prescriptions::delete_prescription),
        )
        .layer(GovernorLayer::new(standard_conf));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", credential_routes.merge(api_routes))
        .fallback(middleware::route_not_found)
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(request_id_header, middleware::MakeRequestUuidOrHeader))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
