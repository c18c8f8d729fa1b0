// src/services/mod.rs

pub mod guard;
pub mod media;
pub mod posts;
pub mod registry;
pub mod session;
