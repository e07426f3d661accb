// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use questa::{
    cache::KvCache,
    config::Config,
    create_router,
    sgif::PassthroughBackend,
    state::AppState,
    storage::FsStore,
    utils::hash::hash_password,
};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false),
        )
        .init();

    let pool = connect_with_retry(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to run migrations: {:?}", e);
            std::process::exit(1);
        });

    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let state = AppState {
        pool,
        config: config.clone(),
        cache: KvCache::new(),
        media: Arc::new(FsStore::new(&config.media_root)),
        sgif: Arc::new(PassthroughBackend),
    };

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind {}: {:?}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", e);
    }
}

async fn connect_with_retry(database_url: &str) -> SqlitePool {
    let mut attempts = 0;
    loop {
        match SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => return pool,
            Err(e) => {
                attempts += 1;
                if attempts >= 5 {
                    tracing::error!("Giving up on database after {} attempts: {:?}", attempts, e);
                    std::process::exit(1);
                }
                tracing::warn!("Database not ready (attempt {}): {:?}", attempts, e);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

/// Creates the admin account on first boot when ADMIN_USERNAME and
/// ADMIN_PASSWORD are configured. Does nothing if the user exists.
async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
    else {
        return Ok(());
    };

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users_v2 WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(password)?;

    sqlx::query(
        "INSERT INTO users_v2 (username, email, password_hash, role)
         VALUES (?, ?, ?, 'admin')",
    )
    .bind(username)
    .bind(format!("{}@local", username))
    .bind(&password_hash)
    .execute(pool)
    .await?;

    tracing::info!("Seeded admin user '{}'", username);
    Ok(())
}
