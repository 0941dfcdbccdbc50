// src/services/mod.rs
pub mod accounts;
pub mod sentiment;
pub mod sessions;
