use crate::api::AppState;
use crate::api::middleware::{AppJson, AppPath, AuthUser};
use crate::api::schemas::prescriptions::{PrescriptionWrite, Verification, VerifyRequest};
use crate::api::schemas::{Acknowledgement, RecordView};
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

pub async fn list_prescriptions(_auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let prescriptions: Vec<_> =
        state.prescription_service.list().await?.into_iter().map(RecordView::from).collect();
    Ok(Json(prescriptions))
}

pub async fn get_prescription(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(RecordView::from(state.prescription_service.get(id).await?)))
}

pub async fn create_prescription(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PrescriptionWrite>,
) -> Result<impl IntoResponse> {
    let created = state.prescription_service.create(payload.prescription).await?;
    Ok((StatusCode::CREATED, Json(RecordView::from(created))))
}

pub async fn update_prescription(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<PrescriptionWrite>,
) -> Result<impl IntoResponse> {
    let updated = state.prescription_service.update(id, payload.version, payload.prescription).await?;
    Ok(Json(RecordView::from(updated)))
}

pub async fn delete_prescription(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.prescription_service.delete(id).await?;
    Ok(Json(Acknowledgement::new("Prescription deleted")))
}

/// Answers with 200 whether or not the prescription is still valid; only an
/// unknown number is a 404.
pub async fn verify_prescription(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyRequest>,
) -> Result<impl IntoResponse> {
    let number = payload.prescription_number.unwrap_or_default();
    let check = state.prescription_service.verify(&number).await?;
    Ok(Json(Verification::from(check)))
}
