use std::sync::Arc;

use axum::{Extension, Json};
use sqlx::SqlitePool;

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser,
    },
    data_formats::{ApiResponse, LoginRequest, RegisterRequest, UpdateUserRequest, UserResponse},
    db_helpers::{get_user_by_email, get_user_by_id, insert_user, update_user_in_db},
    errors::ApiError,
};

use super::JsonResult;

pub async fn login_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(request): Json<LoginRequest>,
) -> JsonResult<UserResponse> {
    let user = get_user_by_email(&pool, &request.email)
        .await
        .map_err(|e| e.to_json_response())?;
    let user = match user {
        Some(user) => user,
        None => {
            return Err(ApiError::Validation("Email not found").to_json_response());
        }
    };
    let is_password_correct = verify_password_argon2(request.password, &user.password)
        .await
        .map_err(|_| ApiError::ServerError.to_json_response())?;
    if !is_password_correct {
        return Err(ApiError::Validation("Incorrect password").to_json_response());
    }

    let token = get_jwt_token(user.id).map_err(|_| ApiError::ServerError.to_json_response())?;
    Ok(Json(ApiResponse::ok(UserResponse::new(user, token))))
}

pub async fn register_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(mut request): Json<RegisterRequest>,
) -> JsonResult<UserResponse> {
    request.password = hash_password_argon2(request.password)
        .await
        .map_err(|_| ApiError::ServerError.to_json_response())?;

    let user = insert_user(&pool, &request).await.map_err(|e| {
        if let ApiError::DatabaseError(sqlx::Error::Database(e)) = &e {
            if e.message().contains("UNIQUE constraint failed") {
                return ApiError::Validation("Email or username already exists")
                    .to_json_response();
            }
        }
        e.to_json_response()
    })?;

    let token = get_jwt_token(user.id).map_err(|_| ApiError::ServerError.to_json_response())?;
    Ok(Json(ApiResponse::with_message(
        UserResponse::new(user, token),
        "User registered",
    )))
}

pub async fn get_current_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id, token }: AuthUser,
) -> JsonResult<UserResponse> {
    let user = get_user_by_id(&pool, id)
        .await
        .map_err(|e| e.to_json_response())?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::TargetNotFound("User not found").to_json_response()),
    };
    Ok(Json(ApiResponse::ok(UserResponse::new(user, token))))
}

pub async fn update_user(
    AuthUser { id, token }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(request): Json<UpdateUserRequest>,
) -> JsonResult<UserResponse> {
    let user = update_user_in_db(&pool, id, request)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::with_message(
        UserResponse::new(user, token),
        "User updated",
    )))
}
