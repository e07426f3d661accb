// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub port: u16,

    /// Root directory of the media blob store.
    pub media_root: String,
    /// Public base URL prepended to stored media keys.
    pub media_base_url: String,

    /// Lifetime of `session:<token>` cache entries, in seconds.
    pub session_ttl_secs: u64,
    /// Lifetime of `questions:<subject>` and `user:profile:<id>` entries.
    pub cache_ttl_secs: u64,

    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
        let media_base_url = env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/media".to_string());

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        Self {
            database_url,
            rust_log,
            port,
            media_root,
            media_base_url,
            session_ttl_secs,
            cache_ttl_secs,
            admin_username,
            admin_password,
        }
    }
}
