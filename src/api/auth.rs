use crate::api::AppState;
use crate::api::middleware::{AppJson, AuthUser};
use crate::api::schemas::Acknowledgement;
use crate::api::schemas::auth::{AccessToken, Login, PasswordChange, Profile, Refresh, Session};
use crate::api::schemas::users::UserView;
use crate::error::Result;
use axum::{Json, extract::State, response::IntoResponse};

pub async fn login(State(state): State<AppState>, AppJson(payload): AppJson<Login>) -> Result<impl IntoResponse> {
    let session = state.auth_service.authenticate(&payload.email, &payload.password).await?;
    Ok(Json(Session::from(session)))
}

pub async fn refresh(State(state): State<AppState>, AppJson(payload): AppJson<Refresh>) -> Result<impl IntoResponse> {
    let access_token = state.auth_service.refresh(payload.refresh_token.as_deref()).await?;
    Ok(Json(AccessToken { access_token }))
}

pub async fn profile(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.account_service.profile(auth_user.user_id).await?;
    Ok(Json(Profile { user: UserView::from(user) }))
}

/// Tokens are stateless, so logging out only tells the client to discard them.
/// No token is required: a client holding an expired one can still log out.
pub async fn logout() -> impl IntoResponse {
    Json(Acknowledgement::new("Logged out successfully"))
}

pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PasswordChange>,
) -> Result<impl IntoResponse> {
    state.account_service.change_password(auth_user.user_id, &payload.current_password, &payload.new_password).await?;
    Ok(Json(Acknowledgement::new("Password updated")))
}
