use sqlx::{Sqlite, SqlitePool};

use crate::{errors::ApiError, models::Comment, pagination::Cursor};

use super::post_helpers::cursor_binds;

const COMMENT_SELECT: &str = r#"
    SELECT comments.id         AS "id",
           comments.content    AS "content",
           comments.post_id    AS "post_id",
           comments.author_id  AS "author_id",
           comments.created_at AS "created_at",
           users.username      AS "author_username",
           users.avatar        AS "author_avatar"
      FROM comments
           JOIN users ON users.id = comments.author_id
"#;

async fn get_comment_by_id(pool: &SqlitePool, comment_id: i64) -> Result<Comment, ApiError> {
    let query = format!("{COMMENT_SELECT} WHERE comments.id = $1");
    let comment = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(comment_id)
        .fetch_optional(pool)
        .await?;
    match comment {
        Some(comment) => Ok(comment),
        None => Err(ApiError::TargetNotFound("Comment not found")),
    }
}

async fn ensure_post_exists(pool: &SqlitePool, post_id: i64) -> Result<(), ApiError> {
    let exists = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(pool)
        .await?;
    match exists {
        Some(_) => Ok(()),
        None => Err(ApiError::TargetNotFound("Post not found")),
    }
}

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    content: String,
) -> Result<Comment, ApiError> {
    let mut tx = pool.begin().await?;
    let exists = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::TargetNotFound("Post not found"));
    }

    let comment_id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO comments (content, author_id, post_id)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(content)
    .bind(author_id)
    .bind(post_id)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    get_comment_by_id(pool, comment_id).await
}

/// Comments for a post, newest first. A non-existent post is a not-found
/// failure, never an empty success list.
pub async fn list_comments_in_db(
    pool: &SqlitePool,
    post_id: i64,
    limit: u32,
    cursor: Option<Cursor>,
) -> Result<Vec<Comment>, ApiError> {
    ensure_post_exists(pool, post_id).await?;

    let (cursor_ts, cursor_id) = cursor_binds(&cursor);
    let query = format!(
        r#"{COMMENT_SELECT}
        WHERE comments.post_id = $1
          AND ( $2 IS NULL
                OR comments.created_at < $2
                OR ( comments.created_at = $2 AND comments.id < $3 ) )
        ORDER BY comments.created_at DESC, comments.id DESC
        LIMIT $4
        "#
    );
    let comments = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(post_id)
        .bind(cursor_ts)
        .bind(cursor_id)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;
    Ok(comments)
}

pub async fn update_comment_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    comment_id: i64,
    content: String,
) -> Result<Comment, ApiError> {
    let mut tx = pool.begin().await?;
    let exists = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT id FROM comments WHERE id = $1 AND post_id = $2",
    )
    .bind(comment_id)
    .bind(post_id)
    .fetch_optional(&mut tx)
    .await?;
    if exists.is_none() {
        return Err(ApiError::TargetNotFound("Comment not found"));
    }

    let result = sqlx::query("UPDATE comments SET content = $1 WHERE id = $2 AND author_id = $3")
        .bind(content)
        .bind(comment_id)
        .bind(author_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::Forbidden);
    }
    tx.commit().await?;

    get_comment_by_id(pool, comment_id).await
}

pub async fn delete_comment_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    comment_id: i64,
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;
    let exists = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT id FROM comments WHERE id = $1 AND post_id = $2",
    )
    .bind(comment_id)
    .bind(post_id)
    .fetch_optional(&mut tx)
    .await?;
    if exists.is_none() {
        return Err(ApiError::TargetNotFound("Comment not found"));
    }

    let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
        .bind(comment_id)
        .bind(author_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::Forbidden);
    }
    tx.commit().await?;
    Ok(())
}
