use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use sqlx::SqlitePool;

use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{ApiResponse, FollowState, ProfileResponse},
    db_helpers::{get_user_by_username, is_following_in_db, toggle_follow_in_db},
    errors::ApiError,
};

use super::JsonResult;

pub async fn get_profile(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(username): Path<String>,
) -> JsonResult<ProfileResponse> {
    let profile = get_user_by_username(&pool, &username)
        .await
        .map_err(|e| e.to_json_response())?;
    let profile = match profile {
        Some(profile) => profile,
        None => return Err(ApiError::TargetNotFound("User not found").to_json_response()),
    };

    let following = match maybe_user.get_id() {
        Some(viewer) => is_following_in_db(&pool, viewer, profile.id)
            .await
            .map_err(|e| e.to_json_response())?,
        None => false,
    };
    Ok(Json(ApiResponse::ok(ProfileResponse::new(
        profile, following,
    ))))
}

pub async fn toggle_follow(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(username): Path<String>,
) -> JsonResult<FollowState> {
    let (_, following) = toggle_follow_in_db(&pool, id, &username)
        .await
        .map_err(|e| e.to_json_response())?;
    let message = if following {
        "Followed user"
    } else {
        "Unfollowed user"
    };
    Ok(Json(ApiResponse::with_message(
        FollowState { following },
        message,
    )))
}
