use sqlx::{Sqlite, SqlitePool};

use crate::{
    authentication::hash_password_argon2,
    data_formats::{RegisterRequest, UpdateUserRequest},
    errors::ApiError,
    models::User,
};

use super::{get_user_by_id, UpdateBuilder};

pub async fn insert_user(pool: &SqlitePool, user: &RegisterRequest) -> Result<User, ApiError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<Sqlite, User>(
        r#"
        INSERT INTO users (email, username, password)
        VALUES ($1, $2, $3)
        RETURNING id, username, email, password, avatar, bio, created_at
        "#,
    )
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.password)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn update_user_in_db(
    pool: &SqlitePool,
    id: i64,
    UpdateUserRequest {
        email,
        bio,
        avatar,
        username,
        password,
    }: UpdateUserRequest,
) -> Result<User, ApiError> {
    let password = match password {
        Some(password) => Some(
            hash_password_argon2(password)
                .await
                .map_err(|_| ApiError::ServerError)?,
        ),
        None => None,
    };

    let builder = UpdateBuilder::new("users")
        .set("email", email)
        .set("bio", bio)
        .set("avatar", avatar)
        .set("username", username)
        .set("password", password);

    if !builder.is_empty() {
        let (query, params) = builder.build("WHERE id = ?");
        let mut tx = pool.begin().await?;
        let mut query = sqlx::query(&query);
        for param in params {
            query = query.bind(param);
        }
        query.bind(id).execute(&mut tx).await?;
        tx.commit().await?;
    }

    match get_user_by_id(pool, id).await? {
        Some(user) => Ok(user),
        None => Err(ApiError::TargetNotFound("User not found")),
    }
}
