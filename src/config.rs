use crate::domain::medication::EXPIRING_SOON_DAYS;
use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

/// Upper bound for either token lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Database connection URL. When unset the server keeps its documents in memory.
    #[arg(long, env = "PHARMACY_DATABASE_URL")]
    pub database_url: Option<String>,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub inventory: InventoryConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PHARMACY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public API
    #[arg(long, env = "PHARMACY_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Port for the management server (liveness and readiness)
    #[arg(long, env = "PHARMACY_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for background tasks during shutdown
    #[arg(long, env = "PHARMACY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "PHARMACY_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Maximum number of pooled connections
    #[arg(long, env = "PHARMACY_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    #[arg(long, env = "PHARMACY_DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    #[arg(long, env = "PHARMACY_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for signing access tokens
    #[arg(long, env = "PHARMACY_ACCESS_SECRET")]
    pub access_secret: String,

    /// Secret key for signing refresh tokens. Must differ from the access secret.
    #[arg(long, env = "PHARMACY_REFRESH_SECRET")]
    pub refresh_secret: String,

    /// Access token time-to-live in seconds
    #[arg(long, env = "PHARMACY_ACCESS_TOKEN_TTL_SECS", default_value_t = 3600)]
    pub access_token_ttl_secs: i64,

    /// Refresh token time-to-live in seconds
    #[arg(long, env = "PHARMACY_REFRESH_TOKEN_TTL_SECS", default_value_t = 604_800)]
    pub refresh_token_ttl_secs: i64,

    /// Email of an administrator account created at boot if missing
    #[arg(long, env = "PHARMACY_BOOTSTRAP_ADMIN_EMAIL")]
    pub bootstrap_admin_email: Option<String>,

    /// Password for the bootstrap administrator
    #[arg(long, env = "PHARMACY_BOOTSTRAP_ADMIN_PASSWORD")]
    pub bootstrap_admin_password: Option<String>,

    /// Display name for the bootstrap administrator
    #[arg(long, env = "PHARMACY_BOOTSTRAP_ADMIN_NAME", default_value = "Administrator")]
    pub bootstrap_admin_name: String,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long, env = "PHARMACY_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long, env = "PHARMACY_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter rate limit for login and refresh
    #[arg(long, env = "PHARMACY_AUTH_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub auth_per_second: u32,

    /// Burst allowance for login and refresh
    #[arg(long, env = "PHARMACY_AUTH_RATE_LIMIT_BURST", default_value_t = 5)]
    pub auth_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct InventoryConfig {
    /// Horizon in days used by the expiring-soon list (0 to 30)
    #[arg(long, env = "PHARMACY_EXPIRING_HORIZON_DAYS", default_value_t = 30)]
    pub expiring_horizon_days: i64,

    /// How often to scan inventory and report low/expiring stock (0 disables)
    #[arg(long, env = "PHARMACY_ALERT_INTERVAL_SECS", default_value_t = 3600)]
    pub alert_interval_secs: u64,

    /// Maximum attempts for a stock adjustment that races another writer
    #[arg(long, env = "PHARMACY_STOCK_RETRY_ATTEMPTS", default_value_t = 5)]
    pub stock_retry_attempts: usize,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the database readiness check
    #[arg(long, env = "PHARMACY_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "PHARMACY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint (gRPC). Tracing export and metrics are disabled when unset.
    #[arg(long, env = "PHARMACY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }

    /// Rejects configurations the server cannot run safely with.
    ///
    /// # Errors
    /// Returns an error if the signing secrets are empty or identical, a token
    /// lifetime is outside `1..=MAX_TOKEN_TTL_SECS`, or the expiring horizon is
    /// outside `0..=EXPIRING_SOON_DAYS`.
    pub fn validate(&self) -> anyhow::Result<()> {
        let auth = &self.auth;
        if auth.access_secret.is_empty() || auth.refresh_secret.is_empty() {
            anyhow::bail!("access and refresh secrets must not be empty");
        }
        if auth.access_secret == auth.refresh_secret {
            anyhow::bail!("access and refresh secrets must differ");
        }
        for ttl in [auth.access_token_ttl_secs, auth.refresh_token_ttl_secs] {
            if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
                anyhow::bail!("token lifetimes must be between 1 and {MAX_TOKEN_TTL_SECS} seconds");
            }
        }
        if auth.bootstrap_admin_email.is_some() != auth.bootstrap_admin_password.is_some() {
            anyhow::bail!("bootstrap admin email and password must be set together");
        }
        if !(0..=EXPIRING_SOON_DAYS).contains(&self.inventory.expiring_horizon_days) {
            anyhow::bail!("expiring horizon must be between 0 and {EXPIRING_SOON_DAYS} days");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Config {
        let mut args = vec!["pharmacy-server", "--access-secret", "a", "--refresh-secret", "b"];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_token_ttl_secs, 604_800);
        assert_eq!(config.inventory.expiring_horizon_days, 30);
        assert_eq!(config.server.port, 5000);
        assert!(config.database_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_shared_secret() {
        let mut config = parse(&[]);
        config.auth.refresh_secret = config.auth.access_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_lifetimes_and_horizon() {
        assert!(parse(&["--access-token-ttl-secs", "0"]).validate().is_err());
        assert!(parse(&["--refresh-token-ttl-secs", "9223372036854775807"]).validate().is_err());
        assert!(parse(&["--expiring-horizon-days=-1"]).validate().is_err());
        assert!(parse(&["--expiring-horizon-days", "31"]).validate().is_err());
        assert!(parse(&["--expiring-horizon-days", "7"]).validate().is_ok());
    }

    #[test]
    fn test_rejects_half_configured_bootstrap_admin() {
        let config = parse(&["--bootstrap-admin-email", "root@pharmacy.test"]);
        assert!(config.validate().is_err());
    }
}
