use crate::api::AppState;
use crate::domain::user::Role;
use crate::error::{AppError, Result};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{HeaderName, Request, request::Parts};
use axum::response::{IntoResponse, Response};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const AUTH_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-auth-token");

/// The caller identified by the `x-auth-token` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// # Errors
    /// `AppError::Forbidden` unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.user_id, role = %self.role, "Role not permitted");
            Err(AppError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts.headers.get(&AUTH_TOKEN_HEADER).map(|v| v.to_str().map_err(|_| AppError::InvalidToken));
        let token = token.transpose()?;

        let identity = state.auth_service.authorize(token)?;
        tracing::Span::current().record("user_id", tracing::field::display(identity.user_id));

        Ok(Self { user_id: identity.user_id, role: identity.role })
    }
}

/// JSON body extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T: serde::Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Fallback for unmatched routes.
pub async fn route_not_found() -> AppError {
    AppError::NotFound
}

/// Keeps a client-supplied `x-request-id`, otherwise generates a UUID v4.
#[derive(Clone, Copy, Debug)]
pub struct MakeRequestUuidOrHeader;

impl MakeRequestId for MakeRequestUuidOrHeader {
    fn make_request_id<B>(&mut self, request: &Request<B>) -> Option<RequestId> {
        if let Some(existing) = request.headers().get("x-request-id") {
            return Some(RequestId::new(existing.clone()));
        }
        Uuid::new_v4().to_string().parse().ok().map(RequestId::new)
    }
}
