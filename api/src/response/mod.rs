use axum::{Json, http::StatusCode};
use serde::Serialize;
use services::error::ServiceError;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// This struct enforces a consistent response structure across all endpoints:
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// - `T` is the type of the `data` payload.
/// - `success` is a boolean indicating operation status.
/// - `message` provides a human-readable context string.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Constructs a success response with the given data and message.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Constructs an error response with a message and default `data`.
    ///
    /// # Requires
    /// - `T` must implement `Default`, since error responses do not include useful data.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// Maps a service failure onto its HTTP status and error envelope.
///
/// | Variant        | Status |
/// |----------------|--------|
/// | `NotFound`     | 404    |
/// | `Validation`   | 400    |
/// | `Conflict`     | 409    |
/// | `Unauthorized` | 401    |
/// | `Forbidden`    | 403    |
/// | `Database`     | 500    |
pub fn service_error<T>(err: ServiceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let status = match &err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::Database(e) => {
            tracing::error!(error = %e, "Database error while handling request");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let message = match err {
        ServiceError::Database(e) => format!("Database error: {e}"),
        other => other.to_string(),
    };
    (status, Json(ApiResponse::error(message)))
}
