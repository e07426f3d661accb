// src/utils/mod.rs

pub mod hash;
pub mod sanitize;
pub mod session;
