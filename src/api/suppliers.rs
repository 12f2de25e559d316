use crate::api::AppState;
use crate::api::middleware::{AppJson, AppPath, AuthUser};
use crate::api::schemas::inventory::SupplierWrite;
use crate::api::schemas::{Acknowledgement, RecordView};
use crate::error::Result;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn list_suppliers(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let suppliers: Vec<_> = state.supplier_service.list().await?.into_iter().map(RecordView::from).collect();
    Ok(Json(suppliers))
}

pub async fn get_supplier(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(RecordView::from(state.supplier_service.get(id).await?)))
}

pub async fn create_supplier(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SupplierWrite>,
) -> Result<impl IntoResponse> {
    let created = state.supplier_service.create(payload.supplier).await?;
    Ok((StatusCode::CREATED, Json(RecordView::from(created))))
}

pub async fn update_supplier(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<SupplierWrite>,
) -> Result<impl IntoResponse> {
    let updated = state.supplier_service.update(id, payload.version, payload.supplier).await?;
    Ok(Json(RecordView::from(updated)))
}

pub async fn delete_supplier(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.supplier_service.delete(id).await?;
    Ok(Json(Acknowledgement::new("Supplier deleted")))
}
