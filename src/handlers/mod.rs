// src/handlers/mod.rs

pub mod auth;
pub mod english;
pub mod math;
pub mod media;
pub mod questions;
pub mod ratings;
