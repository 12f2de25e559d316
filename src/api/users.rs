use crate::api::AppState;
use crate::api::middleware::{AppJson, AppPath, AuthUser};
use crate::api::schemas::users::{CreateUser, RoleChange, UserView};
use crate::domain::user::Role;
use crate::error::Result;
use crate::services::account_service::NewAccount;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUser>,
) -> Result<impl IntoResponse> {
    auth_user.require(&[Role::Admin])?;
    let user = state
        .account_service
        .create(NewAccount { name: payload.name, email: payload.email, password: payload.password, role: payload.role })
        .await?;
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

pub async fn list_users(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    auth_user.require(&[Role::Admin])?;
    let users: Vec<UserView> = state.account_service.list().await?.into_iter().map(Into::into).collect();
    Ok(Json(users))
}

pub async fn change_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<RoleChange>,
) -> Result<impl IntoResponse> {
    auth_user.require(&[Role::Admin])?;
    let user = state.account_service.change_role(id, payload.role).await?;
    Ok(Json(UserView::from(user)))
}
