// src/lib.rs

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod mathexpr;
pub mod models;
pub mod routes;
pub mod sgif;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export specific items for convenience if needed
pub use routes::create_router;
