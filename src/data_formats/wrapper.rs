use serde::{Deserialize, Serialize};

/// Uniform response envelope: `{ success, data, message? }`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> ApiResponse<T> {
        ApiResponse {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: &str) -> ApiResponse<T> {
        ApiResponse {
            success: true,
            data,
            message: Some(message.to_string()),
        }
    }
}
