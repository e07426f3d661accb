// src/models/mod.rs

pub mod composition;
pub mod media;
pub mod question;
pub mod rating;
pub mod user;
