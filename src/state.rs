use std::sync::Arc;

use crate::cache::KvCache;
use crate::config::Config;
use crate::sgif::SgifBackend;
use crate::storage::BlobStore;
use axum::extract::FromRef;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub cache: KvCache,
    pub media: Arc<dyn BlobStore>,
    pub sgif: Arc<dyn SgifBackend>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for KvCache {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}
