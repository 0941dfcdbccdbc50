// src/handlers/mod.rs
pub mod auth;
pub mod chat;
pub mod feedback;
pub mod ui;
