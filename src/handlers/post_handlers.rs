use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{
        ApiResponse, BookmarkState, CreatePostRequest, LikeState, PageParams, PostQueryParams,
        PostResponse, UpdatePostRequest,
    },
    db_helpers::{
        create_post_in_db, delete_post_in_db, get_post_by_id_in_db, list_bookmarked_posts_in_db,
        list_feed_in_db, list_posts_in_db, toggle_bookmark_in_db, toggle_like_in_db,
        update_post_in_db,
    },
    errors::ApiError,
    models::Post,
    pagination::{decode_opt, Cursor, Page},
};

use super::JsonResult;

fn to_post_page(posts: Vec<Post>, limit: u32) -> Page<PostResponse> {
    let page = Page::from_items(posts, limit, |post| Cursor::new(post.created_at, post.id));
    Page {
        items: page.items.into_iter().map(PostResponse::new).collect(),
        next_cursor: page.next_cursor,
    }
}

pub async fn list_posts(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Query(params): Query<PostQueryParams>,
) -> JsonResult<Page<PostResponse>> {
    let cursor = decode_opt(&params.cursor).map_err(|e| e.to_json_response())?;
    let limit = params.limit;
    let posts = list_posts_in_db(&pool, maybe_user.get_id(), params, cursor)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::ok(to_post_page(posts, limit))))
}

pub async fn get_feed(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(params): Query<PageParams>,
) -> JsonResult<Page<PostResponse>> {
    let cursor = decode_opt(&params.cursor).map_err(|e| e.to_json_response())?;
    let posts = list_feed_in_db(&pool, id, params.limit, cursor)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::ok(to_post_page(posts, params.limit))))
}

pub async fn list_bookmarks(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(params): Query<PageParams>,
) -> JsonResult<Page<PostResponse>> {
    let cursor = decode_opt(&params.cursor).map_err(|e| e.to_json_response())?;
    let posts = list_bookmarked_posts_in_db(&pool, id, params.limit, cursor)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::ok(to_post_page(posts, params.limit))))
}

pub async fn get_post(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(post_id): Path<i64>,
) -> JsonResult<PostResponse> {
    let post = get_post_by_id_in_db(&pool, maybe_user.get_id(), post_id)
        .await
        .map_err(|e| e.to_json_response())?;
    match post {
        Some(post) => Ok(Json(ApiResponse::ok(PostResponse::new(post)))),
        None => Err(ApiError::TargetNotFound("Post not found").to_json_response()),
    }
}

pub async fn create_post(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(request): Json<CreatePostRequest>,
) -> JsonResult<PostResponse> {
    let post = create_post_in_db(&pool, id, request)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::with_message(
        PostResponse::new(post),
        "Post created",
    )))
}

pub async fn update_post(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(post_id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> JsonResult<PostResponse> {
    let post = update_post_in_db(&pool, id, post_id, request)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::with_message(
        PostResponse::new(post),
        "Post updated",
    )))
}

pub async fn delete_post(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(post_id): Path<i64>,
) -> JsonResult<()> {
    delete_post_in_db(&pool, id, post_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(ApiResponse::with_message((), "Post deleted")))
}

// ----------------- Toggle Handlers -----------------

pub async fn toggle_like(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(post_id): Path<i64>,
) -> JsonResult<LikeState> {
    let (liked, like_count) = toggle_like_in_db(&pool, id, post_id)
        .await
        .map_err(|e| e.to_json_response())?;
    let message = if liked { "Post liked" } else { "Like removed" };
    Ok(Json(ApiResponse::with_message(
        LikeState { liked, like_count },
        message,
    )))
}

pub async fn toggle_bookmark(
    AuthUser { id, .. }: AuthUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(post_id): Path<i64>,
) -> JsonResult<BookmarkState> {
    let bookmarked = toggle_bookmark_in_db(&pool, id, post_id)
        .await
        .map_err(|e| e.to_json_response())?;
    let message = if bookmarked {
        "Post bookmarked"
    } else {
        "Bookmark removed"
    };
    Ok(Json(ApiResponse::with_message(
        BookmarkState { bookmarked },
        message,
    )))
}
