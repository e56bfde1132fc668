use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A post row joined with its author and the live per-viewer columns.
/// Counts are recomputed by the query, never stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub created_at: NaiveDateTime,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
    pub bookmarked: bool,
    pub author_username: String,
    pub author_avatar: Option<String>,
    pub author_bio: Option<String>,
    pub following: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
    pub created_at: NaiveDateTime,
    pub author_username: String,
    pub author_avatar: Option<String>,
}
