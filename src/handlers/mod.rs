use axum::http::{StatusCode, Uri};
use axum::Json;

use crate::data_formats::ApiResponse;
use crate::errors::ErrorBody;

mod comment_handlers;
mod post_handlers;
mod profile_handlers;
mod user_handlers;

pub use comment_handlers::*;
pub use post_handlers::*;
pub use profile_handlers::*;
pub use user_handlers::*;

pub type JsonResult<T> =
    Result<Json<ApiResponse<T>>, (StatusCode, Json<ErrorBody>)>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(&format!("URL {} provided was not found", uri))),
    )
}
