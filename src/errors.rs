use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::JsonResponse;

#[derive(Debug)]
pub enum ApiError {
    AuthenticationMissing,
    AuthenticationInvalid(&'static str),
    TargetNotFound(&'static str),
    SelfReferenceRejected,
    Forbidden,
    Validation(&'static str),
    BadCursor,
    DatabaseError(sqlx::Error),
    ServerError,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: &str) -> ErrorBody {
        ErrorBody {
            success: false,
            message: message.to_string(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl ApiError {
    pub fn to_json_response(&self) -> JsonResponse<ErrorBody> {
        let (status_code, body) = match self {
            ApiError::AuthenticationMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Authentication required"),
            ),
            ApiError::AuthenticationInvalid(message) => {
                (StatusCode::UNAUTHORIZED, ErrorBody::new(message))
            }
            ApiError::TargetNotFound(message) => (StatusCode::NOT_FOUND, ErrorBody::new(message)),
            ApiError::SelfReferenceRejected => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Cannot follow yourself"),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, ErrorBody::new("Forbidden")),
            ApiError::Validation(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorBody::new(message))
            }
            ApiError::BadCursor => (StatusCode::BAD_REQUEST, ErrorBody::new("Invalid cursor")),
            ApiError::DatabaseError(e) => {
                tracing::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal Server Error"),
                )
            }
            ApiError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal Server Error"),
            ),
        };
        (status_code, Json(body))
    }
}
