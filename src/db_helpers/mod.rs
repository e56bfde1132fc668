use sqlx::{Sqlite, SqlitePool};

use crate::{errors::ApiError, models::User};

mod comment_helpers;
mod post_helpers;
mod relation_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use post_helpers::*;
pub use relation_helpers::*;
pub use user_helpers::*;

const USER_SELECT: &str =
    "SELECT id, username, email, password, avatar, bio, created_at FROM users";

/// Builds partial `UPDATE table SET a = ?, b = ? WHERE ...` statements from
/// the optional fields of an update request. All params are bound as text and
/// coerced by SQLite column affinity.
struct UpdateBuilder {
    query: String,
    params: Vec<String>,
    count: usize,
}

impl UpdateBuilder {
    fn new(table: &str) -> Self {
        Self {
            query: format!("UPDATE {} SET ", table),
            params: Vec::new(),
            count: 0,
        }
    }

    fn set(mut self, column: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            if self.count > 0 {
                self.query.push_str(", ");
            }
            self.query.push_str(column);
            self.query.push_str(" = ?");
            self.params.push(value);
            self.count += 1;
        }
        self
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn build(mut self, where_clause: &str) -> (String, Vec<String>) {
        self.query.push(' ');
        self.query.push_str(where_clause);
        (self.query, self.params)
    }
}

// ----------------- Shared lookups -----------------

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, ApiError> {
    let query = format!("{} WHERE username = $1", USER_SELECT);
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
    let query = format!("{} WHERE email = $1", USER_SELECT);
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, ApiError> {
    let query = format!("{} WHERE id = $1", USER_SELECT);
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
