#![allow(dead_code)]
use clap::Parser;
use pharmacy_server::AppBuilder;
use pharmacy_server::api::{self, MgmtState};
use pharmacy_server::clock::ManualClock;
use pharmacy_server::config::Config;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Once};
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub const ADMIN_EMAIL: &str = "admin@pharmacy.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const START: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("pharmacy_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    Config::try_parse_from([
        "pharmacy-server",
        "--access-secret",
        "test_access_secret",
        "--refresh-secret",
        "test_refresh_secret",
        "--host",
        "127.0.0.1",
        "--per-second",
        "10000",
        "--burst",
        "10000",
        "--auth-per-second",
        "10000",
        "--auth-burst",
        "10000",
        "--bootstrap-admin-email",
        ADMIN_EMAIL,
        "--bootstrap-admin-password",
        ADMIN_PASSWORD,
        "--alert-interval-secs",
        "0",
        "--trusted-proxies",
        "127.0.0.1/32",
    ])
    .unwrap()
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub clock: Arc<ManualClock>,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let clock = Arc::new(ManualClock::new(START));
        let app = AppBuilder::new(config.clone()).with_clock(clock.clone()).build().await.unwrap();

        let router = api::app_router(config.clone(), app.services);
        let mgmt = api::mgmt_router(MgmtState { health_service: app.health_service });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self {
            server_url: format!("http://{addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
            clock,
            config,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.server_url)
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client.post(self.url("/auth/login")).json(&json!({ "email": email, "password": password })).send().await.unwrap()
    }

    /// Logs in and returns the full session body.
    pub async fn session(&self, email: &str, password: &str) -> Value {
        let resp = self.login(email, password).await;
        assert_eq!(resp.status(), 200, "login failed for {email}");
        resp.json().await.unwrap()
    }

    pub async fn admin_token(&self) -> String {
        self.session(ADMIN_EMAIL, ADMIN_PASSWORD).await["accessToken"].as_str().unwrap().to_string()
    }

    /// Creates an account through the admin API and returns its access token.
    pub async fn register_user(&self, email: &str, role: &str) -> String {
        let admin = self.admin_token().await;
        let resp = self
            .client
            .post(self.url("/users"))
            .header("x-auth-token", &admin)
            .json(&json!({ "name": "Test User", "email": email, "password": "password123", "role": role }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        self.session(email, "password123").await["accessToken"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.get(self.url(path)).header("x-auth-token", token).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client.post(self.url(path)).header("x-auth-token", token).json(body).send().await.unwrap()
    }

    pub async fn put(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client.put(self.url(path)).header("x-auth-token", token).json(body).send().await.unwrap()
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).header("x-auth-token", token).send().await.unwrap()
    }
}

pub fn medication_body(name: &str, stock: i64, reorder_level: i64, expiration_date: &str) -> Value {
    json!({
        "name": name,
        "genericName": format!("{name} generic"),
        "manufacturer": "Acme Pharma",
        "category": "Antibiotic",
        "dosage": "500mg",
        "form": "Capsule",
        "price": 9.5,
        "costPrice": 6.0,
        "batchNumber": format!("LOT-{name}"),
        "expirationDate": expiration_date,
        "reorderLevel": reorder_level,
        "currentStock": stock,
        "barcode": format!("BC-{name}"),
    })
}
