use sqlx::{Sqlite, SqlitePool};

use crate::data_formats::{CreatePostRequest, PostQueryParams, UpdatePostRequest};
use crate::errors::ApiError;
use crate::models::Post;
use crate::pagination::Cursor;

use super::UpdateBuilder;

// $1 is always the viewer id (nullable); the per-viewer EXISTS columns come
// back false for anonymous viewers because `user_id = NULL` matches nothing.
const POST_SELECT: &str = r#"
    SELECT posts.id                                  AS "id",
           posts.title                               AS "title",
           posts.content                             AS "content",
           posts.author_id                           AS "author_id",
           posts.created_at                          AS "created_at",
           (SELECT Count(*)
              FROM likes
             WHERE likes.post_id = posts.id)         AS "like_count",
           (SELECT Count(*)
              FROM comments
             WHERE comments.post_id = posts.id)      AS "comment_count",
           EXISTS (SELECT 1
                     FROM likes
                    WHERE likes.post_id = posts.id
                      AND likes.user_id = $1)        AS "liked",
           EXISTS (SELECT 1
                     FROM bookmarks
                    WHERE bookmarks.post_id = posts.id
                      AND bookmarks.user_id = $1)    AS "bookmarked",
           users.username                            AS "author_username",
           users.avatar                              AS "author_avatar",
           users.bio                                 AS "author_bio",
           EXISTS (SELECT 1
                     FROM follows
                    WHERE follows.followed_id = posts.author_id
                      AND follows.follower_id = $1)  AS "following"
      FROM posts
           JOIN users ON users.id = posts.author_id
"#;

pub(super) fn cursor_binds(cursor: &Option<Cursor>) -> (Option<String>, Option<i64>) {
    match cursor {
        Some(cursor) => (Some(cursor.sql_timestamp()), Some(cursor.id)),
        None => (None, None),
    }
}

pub async fn list_posts_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    PostQueryParams {
        author, q, limit, ..
    }: PostQueryParams,
    cursor: Option<Cursor>,
) -> Result<Vec<Post>, ApiError> {
    let (cursor_ts, cursor_id) = cursor_binds(&cursor);
    let query = format!(
        r#"{POST_SELECT}
        WHERE ( users.username = $2 OR $2 IS NULL )
          AND ( $3 IS NULL
                OR posts.title LIKE '%' || $3 || '%'
                OR posts.content LIKE '%' || $3 || '%' )
          AND ( $4 IS NULL
                OR posts.created_at < $4
                OR ( posts.created_at = $4 AND posts.id < $5 ) )
        ORDER BY posts.created_at DESC, posts.id DESC
        LIMIT $6
        "#
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(viewer)
        .bind(author)
        .bind(q)
        .bind(cursor_ts)
        .bind(cursor_id)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn list_feed_in_db(
    pool: &SqlitePool,
    viewer: i64,
    limit: u32,
    cursor: Option<Cursor>,
) -> Result<Vec<Post>, ApiError> {
    let (cursor_ts, cursor_id) = cursor_binds(&cursor);
    let query = format!(
        r#"{POST_SELECT}
           JOIN follows ON follows.followed_id = posts.author_id
                       AND follows.follower_id = $1
        WHERE ( $2 IS NULL
                OR posts.created_at < $2
                OR ( posts.created_at = $2 AND posts.id < $3 ) )
        ORDER BY posts.created_at DESC, posts.id DESC
        LIMIT $4
        "#
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(viewer)
        .bind(cursor_ts)
        .bind(cursor_id)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn list_bookmarked_posts_in_db(
    pool: &SqlitePool,
    viewer: i64,
    limit: u32,
    cursor: Option<Cursor>,
) -> Result<Vec<Post>, ApiError> {
    let (cursor_ts, cursor_id) = cursor_binds(&cursor);
    let query = format!(
        r#"{POST_SELECT}
           JOIN bookmarks AS marks ON marks.post_id = posts.id
                                  AND marks.user_id = $1
        WHERE ( $2 IS NULL
                OR posts.created_at < $2
                OR ( posts.created_at = $2 AND posts.id < $3 ) )
        ORDER BY posts.created_at DESC, posts.id DESC
        LIMIT $4
        "#
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(viewer)
        .bind(cursor_ts)
        .bind(cursor_id)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn get_post_by_id_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    post_id: i64,
) -> Result<Option<Post>, ApiError> {
    let query = format!("{POST_SELECT} WHERE posts.id = $2");
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(viewer)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    CreatePostRequest { title, content }: CreatePostRequest,
) -> Result<Post, ApiError> {
    let mut tx = pool.begin().await?;
    let post_id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO posts (title, content, author_id)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    match get_post_by_id_in_db(pool, Some(author_id), post_id).await? {
        Some(post) => Ok(post),
        None => Err(ApiError::ServerError),
    }
}

pub async fn update_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    UpdatePostRequest { title, content }: UpdatePostRequest,
) -> Result<Post, ApiError> {
    let builder = UpdateBuilder::new("posts")
        .set("title", title)
        .set("content", content);
    if builder.is_empty() {
        return Err(ApiError::Validation("Nothing to update"));
    }

    let mut tx = pool.begin().await?;
    let exists = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::TargetNotFound("Post not found"));
    }

    let (query, params) = builder.build("WHERE id = ? AND author_id = ?");
    let mut query = sqlx::query(&query);
    for param in params {
        query = query.bind(param);
    }
    let result = query.bind(post_id).bind(author_id).execute(&mut tx).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::Forbidden);
    }
    tx.commit().await?;

    match get_post_by_id_in_db(pool, Some(author_id), post_id).await? {
        Some(post) => Ok(post),
        None => Err(ApiError::ServerError),
    }
}

pub async fn delete_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;
    let exists = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::TargetNotFound("Post not found"));
    }

    let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
        .bind(post_id)
        .bind(author_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::Forbidden);
    }
    tx.commit().await?;
    Ok(())
}
