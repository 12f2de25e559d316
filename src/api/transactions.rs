use crate::api::AppState;
use crate::api::middleware::{AppJson, AppPath, AuthUser};
use crate::api::schemas::inventory::TransactionWrite;
use crate::api::schemas::{Acknowledgement, RecordView};
use crate::error::Result;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn list_transactions(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let transactions: Vec<_> = state.transaction_service.list().await?.into_iter().map(RecordView::from).collect();
    Ok(Json(transactions))
}

pub async fn get_transaction(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(RecordView::from(state.transaction_service.get(id).await?)))
}

pub async fn create_transaction(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TransactionWrite>,
) -> Result<impl IntoResponse> {
    let (draft, _) = payload.into_parts();
    let created = state.transaction_service.create(auth_user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(RecordView::from(created))))
}

pub async fn update_transaction(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TransactionWrite>,
) -> Result<impl IntoResponse> {
    let (draft, version) = payload.into_parts();
    let updated = state.transaction_service.update(id, version, draft).await?;
    Ok(Json(RecordView::from(updated)))
}

pub async fn delete_transaction(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.transaction_service.delete(id).await?;
    Ok(Json(Acknowledgement::new("Transaction deleted")))
}
