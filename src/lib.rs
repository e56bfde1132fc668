mod authentication;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;
mod pagination;

pub mod client;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use data_formats::*;
pub use errors::ErrorBody;
use handlers::*;
pub use pagination::{Cursor, Page};
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};
use tower_http::trace::TraceLayer;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(app: Router, pool: SqlitePool, address: SocketAddr) -> Result<()> {
    let app = app
        .layer(Extension(Arc::new(pool)))
        .layer(TraceLayer::new_for_http());
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!("creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .context("Failed to create database")?;
    }
    // A single connection serializes the toggle transactions, so two racing
    // check-then-act sequences can never interleave; the relation primary
    // keys are the backstop.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(db_url)
        .await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations completed");
    Ok(pool)
}

pub fn get_random_free_port() -> (u16, SocketAddr) {
    let listener = TcpListener::bind("localhost:0").unwrap();
    match listener.local_addr() {
        Ok(addr) => (addr.port(), addr),
        Err(_) => panic!("Could not get a free port"),
    }
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/users", post(register_user))
        .route("/users/login", post(login_user))
        .route("/user", get(get_current_user).put(update_user))
        .route("/profiles/:username", get(get_profile))
        .route("/profiles/:username/follow", post(toggle_follow))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/feed", get(get_feed))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/like", post(toggle_like))
        .route("/posts/:id/bookmark", post(toggle_bookmark))
        .route(
            "/posts/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/posts/:id/comments/:comment_id",
            put(update_comment).delete(delete_comment),
        )
        .route("/bookmarks", get(list_bookmarks))
        .fallback(not_found)
}
