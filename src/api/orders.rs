use crate::api::AppState;
use crate::api::middleware::{AppJson, AppPath, AuthUser};
use crate::api::schemas::inventory::{OrderWrite, StatusChange};
use crate::api::schemas::{Acknowledgement, RecordView};
use crate::error::Result;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn list_orders(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let orders: Vec<_> = state.order_service.list().await?.into_iter().map(RecordView::from).collect();
    Ok(Json(orders))
}

pub async fn get_order(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(RecordView::from(state.order_service.get(id).await?)))
}

pub async fn create_order(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<OrderWrite>,
) -> Result<impl IntoResponse> {
    let (draft, _) = payload.into_parts();
    let created = state.order_service.create(auth_user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(RecordView::from(created))))
}

pub async fn update_order(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<OrderWrite>,
) -> Result<impl IntoResponse> {
    let (draft, version) = payload.into_parts();
    let updated = state.order_service.update(id, version, draft).await?;
    Ok(Json(RecordView::from(updated)))
}

pub async fn change_status(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<StatusChange>,
) -> Result<impl IntoResponse> {
    let updated = state.order_service.set_status(id, payload.status).await?;
    Ok(Json(RecordView::from(updated)))
}

pub async fn delete_order(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.order_service.delete(id).await?;
    Ok(Json(Acknowledgement::new("Order deleted")))
}
