// src/lib.rs
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod storage;
pub mod utils;
pub mod verify;
