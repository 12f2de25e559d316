use crate::domain::user::{Role, User, UserSummary, normalize_email};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use crate::storage::{AccountRepository, Record};
use opentelemetry::{global, metrics::Counter};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Debug)]
struct AccountMetrics {
    users_created_total: Counter<u64>,
}

impl AccountMetrics {
    fn new() -> Self {
        let meter = global::meter("pharmacy-server");
        Self {
            users_created_total: meter
                .u64_counter("users_created_total")
                .with_description("Total number of accounts created")
                .build(),
        }
    }
}

#[derive(Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub(crate) fn summarize(user: &Record<User>) -> UserSummary {
    UserSummary { id: user.id, name: user.data.name.clone(), email: user.data.email.clone(), role: user.data.role }
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!("password must be at least {MIN_PASSWORD_LEN} characters")));
    }
    Ok(())
}

/// Account lifecycle: creation, role changes and password changes.
/// Accounts are never deleted.
#[derive(Clone, Debug)]
pub struct AccountService {
    users: AccountRepository,
    auth_service: AuthService,
    metrics: AccountMetrics,
}

impl AccountService {
    #[must_use]
    pub fn new(users: AccountRepository, auth_service: AuthService) -> Self {
        Self { users, auth_service, metrics: AccountMetrics::new() }
    }

    /// # Errors
    /// `AppError::NotFound` if the account no longer exists.
    #[tracing::instrument(err(level = "debug"), skip(self), fields(user_id = %user_id))]
    pub async fn profile(&self, user_id: Uuid) -> Result<UserSummary> {
        let user = self.users.find_by_id(user_id).await?.ok_or(AppError::NotFound)?;
        Ok(summarize(&user))
    }

    #[tracing::instrument(err, skip(self))]
    pub async fn list(&self) -> Result<Vec<UserSummary>> {
        Ok(self.users.find_all().await?.iter().map(summarize).collect())
    }

    /// # Errors
    /// `AppError::BadRequest` for invalid input, `AppError::Conflict` if the email is taken.
    #[tracing::instrument(err(level = "warn"), skip(self, account), fields(user_id = tracing::field::Empty))]
    pub async fn create(&self, account: NewAccount) -> Result<UserSummary> {
        let email = normalize_email(&account.email);
        if account.name.trim().is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        if !email.contains('@') {
            return Err(AppError::BadRequest("email is not valid".into()));
        }
        check_password(&account.password)?;

        let password_hash = self.auth_service.hash_password(&account.password).await?;
        let user = self
            .users
            .create(User { name: account.name.trim().to_string(), email, password_hash, role: account.role })
            .await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        tracing::info!(role = %user.data.role, "Account created");
        self.metrics.users_created_total.add(1, &[]);

        Ok(summarize(&user))
    }

    /// Changes an account's role. Takes effect on the holder's next refresh.
    ///
    /// # Errors
    /// `AppError::NotFound` if the account does not exist.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(user_id = %user_id))]
    pub async fn change_role(&self, user_id: Uuid, role: Role) -> Result<UserSummary> {
        let user = self.users.find_by_id(user_id).await?.ok_or(AppError::NotFound)?;
        let mut data = user.data;
        data.role = role;
        let updated = self.users.update(user.id, user.version, data).await?;
        tracing::info!(role = %role, "Account role changed");
        Ok(summarize(&updated))
    }

    /// # Errors
    /// `AppError::InvalidCredentials` if `current` does not match.
    #[tracing::instrument(err(level = "warn"), skip(self, current, new), fields(user_id = %user_id))]
    pub async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> Result<()> {
        let user = self.users.find_by_id(user_id).await?.ok_or(AppError::NotFound)?;
        if !self.auth_service.verify_password(current, &user.data.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        check_password(new)?;

        let mut data = user.data;
        data.password_hash = self.auth_service.hash_password(new).await?;
        self.users.update(user.id, user.version, data).await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Creates the configured administrator unless an account with that email exists.
    ///
    /// # Errors
    /// Propagates storage and validation failures.
    #[tracing::instrument(err, skip(self, password))]
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<()> {
        if self.users.find_one_by("email", &normalize_email(email)).await?.is_some() {
            tracing::debug!("Bootstrap admin already present");
            return Ok(());
        }
        self.create(NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::AuthConfig;
    use crate::storage::{DocumentStore, MemoryDocumentStore};
    use std::sync::Arc;

    fn setup() -> (AccountService, AuthService) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let users = AccountRepository::new(store);
        let config = AuthConfig {
            access_secret: "a".into(),
            refresh_secret: "r".into(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 604_800,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
            bootstrap_admin_name: "Administrator".into(),
        };
        let auth = AuthService::new(config, users.clone(), Arc::new(SystemClock));
        (AccountService::new(users, auth.clone()), auth)
    }

    fn new_account(email: &str) -> NewAccount {
        NewAccount { name: "Sam".into(), email: email.into(), password: "correct horse".into(), role: Role::Staff }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_rejects_duplicates() {
        let (accounts, _) = setup();
        let created = accounts.create(new_account("Sam@Pharmacy.test")).await.unwrap();
        assert_eq!(created.email, "sam@pharmacy.test");

        let dup = accounts.create(new_account("sam@pharmacy.TEST")).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (accounts, _) = setup();
        let mut short = new_account("x@pharmacy.test");
        short.password = "short".into();
        assert!(matches!(accounts.create(short).await, Err(AppError::BadRequest(_))));
        assert!(matches!(accounts.create(new_account("not-an-email")).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (accounts, auth) = setup();
        let created = accounts.create(new_account("sam@pharmacy.test")).await.unwrap();

        let wrong = accounts.change_password(created.id, "nope", "new password 1").await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

        accounts.change_password(created.id, "correct horse", "new password 1").await.unwrap();
        assert!(auth.authenticate("sam@pharmacy.test", "new password 1").await.is_ok());
        assert!(auth.authenticate("sam@pharmacy.test", "correct horse").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let (accounts, _) = setup();
        accounts.ensure_admin("Root", "root@pharmacy.test", "bootstrap-pass").await.unwrap();
        accounts.ensure_admin("Root", "root@pharmacy.test", "other-pass-123").await.unwrap();

        let users = accounts.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Admin);
    }
}
