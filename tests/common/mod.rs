// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use questa::{
    cache::KvCache,
    config::Config,
    create_router,
    sgif::PassthroughBackend,
    state::AppState,
    storage::FsStore,
    utils::hash::hash_password,
};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub pool: SqlitePool,
    _media_dir: tempfile::TempDir,
}

/// Spawns the app on a random port backed by an in-memory database.
///
/// The pool is capped at one connection: every connection to
/// `sqlite::memory:` is its own database, so the tests must share one.
pub async fn spawn_app() -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let media_dir = tempfile::tempdir().expect("Failed to create media dir");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "info".to_string(),
        port: 0,
        media_root: media_dir.path().to_string_lossy().into_owned(),
        media_base_url: "http://localhost/media".to_string(),
        session_ttl_secs: 3600,
        cache_ttl_secs: 60,
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        cache: KvCache::new(),
        media: Arc::new(FsStore::new(media_dir.path())),
        sgif: Arc::new(PassthroughBackend),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        pool,
        _media_dir: media_dir,
    }
}

impl TestApp {
    /// Registers a fresh user and returns a session token for them.
    pub async fn register_and_login(&self, username: &str) -> String {
        let response = self
            .client
            .post(format!("{}/api/auth/register", self.address))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123",
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(response.status().as_u16(), 201);

        self.login(username, "password123").await
    }

    /// Seeds an admin user directly in the database and logs in.
    pub async fn login_admin(&self) -> String {
        let hash = hash_password("adminpass123").expect("Failed to hash password");
        sqlx::query(
            "INSERT INTO users_v2 (username, email, password_hash, role)
             VALUES ('admin', 'admin@example.com', ?, 'admin')",
        )
        .bind(&hash)
        .execute(&self.pool)
        .await
        .expect("Failed to seed admin");

        self.login("admin", "adminpass123").await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.address))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to login");
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await.expect("Invalid login body");
        body["token"].as_str().expect("Missing token").to_string()
    }

    /// Creates a question through the API, returning its ID.
    pub async fn create_question(&self, admin_token: &str, subject: &str, text: &str) -> i64 {
        let response = self
            .client
            .post(format!("{}/api/questions", self.address))
            .bearer_auth(admin_token)
            .json(&json!({
                "subject": subject,
                "question_text": text,
                "choices": ["A", "B", "C"],
                "correct_answer": "A",
            }))
            .send()
            .await
            .expect("Failed to create question");
        assert_eq!(response.status().as_u16(), 201);

        let body: serde_json::Value = response.json().await.expect("Invalid create body");
        body["id"].as_i64().expect("Missing question id")
    }
}
