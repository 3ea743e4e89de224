use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use moodtracker_api::auth::rate_limit::spawn_cleanup_worker;
use moodtracker_api::config::Config;
use moodtracker_api::db::{self, MemoryStore, MoodStore, PgStore};
use moodtracker_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodtracker_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn MoodStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.db_max_connections)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records are kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = config.listen_addr();
    let state = AppState::new(store, config);
    spawn_cleanup_worker(state.rate_limiter.clone());

    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    // Client addresses feed the auth rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
