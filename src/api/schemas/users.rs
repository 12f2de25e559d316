use crate::domain::user::{Role, UserSummary};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account without its password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<UserSummary> for UserView {
    fn from(user: UserSummary) -> Self {
        Self { id: user.id, name: user.name, email: user.email, role: user.role }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}
