use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::domain::auth::{AccessClaims, AuthSession, Identity, Password, RefreshClaims, TokenClaims};
use crate::domain::user::{User, normalize_email};
use crate::error::{AppError, Result};
use crate::storage::{AccountRepository, Record};
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    login_total: Counter<u64>,
    login_failed_total: Counter<u64>,
    refresh_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("pharmacy-server");
        Self {
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of successful login attempts")
                .build(),
            login_failed_total: meter
                .u64_counter("auth_login_failed_total")
                .with_description("Total number of rejected login attempts")
                .build(),
            refresh_total: meter
                .u64_counter("auth_refresh_total")
                .with_description("Total number of access tokens minted from refresh tokens")
                .build(),
        }
    }
}

/// Verifies credentials and issues, refreshes and verifies signed tokens.
///
/// Tokens are stateless: validity is signature plus expiry, checked against
/// the injected clock. Access and refresh tokens use disjoint secrets.
#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
    users: AccountRepository,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(config: AuthConfig, users: AccountRepository, clock: Arc<dyn Clock>) -> Self {
        Self { config, users, clock, metrics: Metrics::new() }
    }

    /// Checks `email`/`password` and issues a token pair.
    ///
    /// An unknown email and a wrong password both yield `InvalidCredentials`.
    ///
    /// # Errors
    /// `AppError::InvalidCredentials` on any credential mismatch.
    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession> {
        let Some(user) = self.users.find_one_by("email", &normalize_email(email)).await? else {
            // Spend the same hashing effort as a real comparison.
            self.hash_password(password).await?;
            tracing::warn!("Login failed: user not found");
            self.metrics.login_failed_total.add(1, &[]);
            return Err(AppError::InvalidCredentials);
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !self.verify_password(password, &user.data.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            self.metrics.login_failed_total.add(1, &[]);
            return Err(AppError::InvalidCredentials);
        }

        let session = self.create_session(&user)?;
        tracing::info!("User logged in successfully");
        self.metrics.login_total.add(1, &[]);
        Ok(session)
    }

    /// Mints a new access token from a refresh token, using the account's current role.
    /// The refresh token itself is not rotated.
    ///
    /// # Errors
    /// `AppError::MissingToken` if absent, `AppError::InvalidToken` if it does not
    /// verify, has expired, or its account no longer exists.
    #[tracing::instrument(skip(self, refresh_token), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String> {
        let token = refresh_token.map(str::trim).filter(|t| !t.is_empty()).ok_or(AppError::MissingToken)?;
        let claims = RefreshClaims::decode(token, &self.config.refresh_secret, self.now())?;

        tracing::Span::current().record("user_id", tracing::field::display(claims.user_id));

        let user = self.users.find_by_id(claims.user_id).await?.ok_or_else(|| {
            tracing::warn!("Refresh rejected: account no longer exists");
            AppError::InvalidToken
        })?;

        let access_token = self.issue_access_token(&user)?;
        self.metrics.refresh_total.add(1, &[]);
        Ok(access_token)
    }

    /// Establishes the caller's identity from an access token. Role policy is
    /// left to the caller.
    ///
    /// # Errors
    /// `AppError::MissingToken` if absent, `AppError::InvalidToken` otherwise.
    pub fn authorize(&self, access_token: Option<&str>) -> Result<Identity> {
        let token = access_token.map(str::trim).filter(|t| !t.is_empty()).ok_or(AppError::MissingToken)?;
        let claims = AccessClaims::decode(token, &self.config.access_secret, self.now())?;
        Ok(Identity { user_id: claims.user_id, role: claims.role })
    }

    #[tracing::instrument(err, skip(self, password))]
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || Password::hash(&password)).await.map_err(|_| AppError::Internal)?
    }

    #[tracing::instrument(err, skip(self, password, password_hash))]
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || Password::verify(&password, &password_hash))
            .await
            .map_err(|_| AppError::Internal)?
    }

    fn create_session(&self, user: &Record<User>) -> Result<AuthSession> {
        let now = self.now();
        let exp = now.saturating_add(self.config.refresh_token_ttl_secs);
        let refresh = RefreshClaims { user_id: user.id, iat: now, exp };

        Ok(AuthSession {
            access_token: self.issue_access_token(user)?,
            refresh_token: refresh.encode(&self.config.refresh_secret)?,
            user: super::account_service::summarize(user),
        })
    }

    fn issue_access_token(&self, user: &Record<User>) -> Result<String> {
        let now = self.now();
        let exp = now.saturating_add(self.config.access_token_ttl_secs);
        let claims = AccessClaims { user_id: user.id, role: user.data.role, iat: now, exp };
        claims.encode(&self.config.access_secret)
    }

    fn now(&self) -> i64 {
        self.clock.now().unix_timestamp()
    }
}
