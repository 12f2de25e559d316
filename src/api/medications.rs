use crate::api::AppState;
use crate::api::middleware::{AppJson, AppPath, AuthUser};
use crate::api::schemas::Acknowledgement;
use crate::api::schemas::medications::{MedicationView, MedicationWrite, Scan, SearchParams, StockAdjustment, views};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn list_medications(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(views(state.inventory_service.list().await?)))
}

pub async fn get_medication(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(MedicationView::from(state.inventory_service.get(id).await?)))
}

pub async fn create_medication(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<MedicationWrite>,
) -> Result<impl IntoResponse> {
    let created = state.inventory_service.create(payload.medication).await?;
    Ok((StatusCode::CREATED, Json(MedicationView::from(created))))
}

pub async fn update_medication(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<MedicationWrite>,
) -> Result<impl IntoResponse> {
    let updated = state.inventory_service.update(id, payload.version, payload.medication).await?;
    Ok(Json(MedicationView::from(updated)))
}

pub async fn delete_medication(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.inventory_service.delete(id).await?;
    Ok(Json(Acknowledgement::new("Medication deleted")))
}

pub async fn search_medications(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(params) = params.map_err(AppError::from)?;
    Ok(Json(views(state.inventory_service.search(params.term.as_deref()).await?)))
}

pub async fn low_stock(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(views(state.inventory_service.low_stock().await?)))
}

pub async fn expiring_soon(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(views(state.inventory_service.expiring_soon().await?)))
}

pub async fn scan(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<Scan>,
) -> Result<impl IntoResponse> {
    Ok(Json(MedicationView::from(state.inventory_service.scan(payload.barcode.as_deref()).await?)))
}

pub async fn adjust_stock(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<StockAdjustment>,
) -> Result<impl IntoResponse> {
    let adjusted = state.inventory_service.adjust_stock(id, payload.delta).await?;
    Ok(Json(MedicationView::from(adjusted)))
}
