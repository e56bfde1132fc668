use std::net::SocketAddr;

use quillpost::{init_db, make_router, run_app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("quillpost=info,tower_http=info")),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3001);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let db_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::error!("DATABASE_URL must be set");
            return;
        }
    };
    let pool = match init_db(&db_url).await {
        Ok(pool) => pool,
        Err(error) => {
            tracing::error!("failed to initialize database: {}", error);
            return;
        }
    };

    let router = make_router();
    tracing::info!("server started on {}", addr);
    if let Err(error) = run_app(router, pool, addr).await {
        tracing::error!("server error: {}", error);
    }
}
