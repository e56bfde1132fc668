use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::AuthUser,
    data_formats::{ApiResponse, CommentRequest, CommentResponse, PageParams},
    db_helpers::{
        add_comment_to_post_in_db, delete_comment_in_db, list_comments_in_db,
        update_comment_in_db,
    },
    pagination::{decode_opt, Cursor, Page},
};

use super::JsonResult;

pub async fn list_comments(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(post_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> JsonResult<Page<CommentResponse>> {
    let cursor = decode_opt(&params.cursor).map_err(|e| e.to_json_response())?;
    let comments = list_comments_in_db(&pool, post_id, params.limit, cursor)
        .await
        .map_err(|e| e.to_json_response())?;
    let page = Page::from_items(comments, params.limit, |comment| {
        Cursor::new(comment.created_at, comment.id)
    });
    let page = Page {
        items: page.items.into_iter().map(CommentResponse::new).collect(),
        next_cursor: page.next_cursor,
    };
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn create_comment(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(post_id): Path<i64>,
    Json(CommentRequest { content }): Json<CommentRequest>,
) -> JsonResult<CommentResponse> {
    let comment = add_comment_to_post_in_db(&pool, id, post_id, content)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::with_message(
        CommentResponse::new(comment),
        "Comment added",
    )))
}

pub async fn update_comment(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(CommentRequest { content }): Json<CommentRequest>,
) -> JsonResult<CommentResponse> {
    let comment = update_comment_in_db(&pool, id, post_id, comment_id, content)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::with_message(
        CommentResponse::new(comment),
        "Comment updated",
    )))
}

pub async fn delete_comment(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> JsonResult<()> {
    delete_comment_in_db(&pool, id, post_id, comment_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::with_message((), "Comment deleted")))
}
