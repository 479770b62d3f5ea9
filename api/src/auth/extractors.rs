use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::auth::guards::Empty;
use crate::auth::user::AuthUser;
use crate::response::ApiResponse;

/// Reads the session id from an `Authorization: Bearer <id>` header.
pub async fn bearer_token(parts: &mut Parts) -> Option<String> {
    TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, &())
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
}

/// Pulls the [`AuthUser`] a guard already placed in the request extensions.
///
/// # Errors
/// - `401 Unauthorized` when the route is not behind an authentication guard.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiResponse<Empty>>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Authentication required")),
        ))
    }
}
