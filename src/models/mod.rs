// src/models/mod.rs

pub mod category;
pub mod media;
pub mod post;
pub mod user;
