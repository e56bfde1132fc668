use sqlx::{Sqlite, SqlitePool};

use crate::{errors::ApiError, models::User};

use super::get_user_by_username;

// The toggles below run delete-first-then-insert-or-ignore inside a single
// transaction. Combined with the primary key on each relation table this
// keeps the row count for a pair at 0 or 1 under concurrent requests, and
// the returned state is always what the database holds at commit time.

/// Flips the follow relation towards `username` and returns the target user
/// plus the resulting state.
pub async fn toggle_follow_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    username: &str,
) -> Result<(User, bool), ApiError> {
    let target = match get_user_by_username(pool, username).await? {
        Some(user) => user,
        None => return Err(ApiError::TargetNotFound("User not found")),
    };
    if target.id == follower_id {
        return Err(ApiError::SelfReferenceRejected);
    }

    let mut tx = pool.begin().await?;
    let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
        .bind(follower_id)
        .bind(target.id)
        .execute(&mut tx)
        .await?
        .rows_affected();

    let following = if deleted == 0 {
        sqlx::query("INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES ($1, $2)")
            .bind(follower_id)
            .bind(target.id)
            .execute(&mut tx)
            .await?;
        true
    } else {
        false
    };
    tx.commit().await?;

    Ok((target, following))
}

/// Flips the like relation on a post, returning the resulting state and the
/// live recomputed like count.
pub async fn toggle_like_in_db(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
) -> Result<(bool, i64), ApiError> {
    let mut tx = pool.begin().await?;
    let exists = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::TargetNotFound("Post not found"));
    }

    let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut tx)
        .await?
        .rows_affected();

    let liked = if deleted == 0 {
        sqlx::query("INSERT OR IGNORE INTO likes (user_id, post_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut tx)
            .await?;
        true
    } else {
        false
    };

    let like_count =
        sqlx::query_scalar::<Sqlite, i64>("SELECT Count(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut tx)
            .await?;
    tx.commit().await?;

    Ok((liked, like_count))
}

/// Flips the bookmark relation on a post and returns the resulting state.
pub async fn toggle_bookmark_in_db(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
) -> Result<bool, ApiError> {
    let mut tx = pool.begin().await?;
    let exists = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::TargetNotFound("Post not found"));
    }

    let deleted = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut tx)
        .await?
        .rows_affected();

    let bookmarked = if deleted == 0 {
        sqlx::query("INSERT OR IGNORE INTO bookmarks (user_id, post_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut tx)
            .await?;
        true
    } else {
        false
    };
    tx.commit().await?;

    Ok(bookmarked)
}

/// Whether `follower_id` currently follows `followed_id`.
pub async fn is_following_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<bool, ApiError> {
    let row = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2",
    )
    .bind(follower_id)
    .bind(followed_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}
