// src/models/mod.rs
pub mod server;
