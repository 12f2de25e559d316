use crate::api::schemas::users::UserView;
use crate::domain::auth::AuthSession;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refresh {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserView,
}

impl From<AuthSession> for Session {
    fn from(session: AuthSession) -> Self {
        Self { access_token: session.access_token, refresh_token: session.refresh_token, user: session.user.into() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
}

/// Body of `GET /auth/profile`.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub user: UserView,
}
