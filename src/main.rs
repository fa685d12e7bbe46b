// src/main.rs
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;

use masterlist::config::Config;
use masterlist::handlers;
use masterlist::handlers::RateLimiters;
use masterlist::registry::{Registry, SystemClock};
use masterlist::storage::memory::DirectoryStore;
use masterlist::verify::{HttpVerifier, ThreadRngChallenge};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    dotenv::dotenv().ok();
    let config = Config::from_env();

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind = format!("{}:{}", bind_address, port);

    let verifier = HttpVerifier::new(
        Box::new(ThreadRngChallenge),
        config.master_host.clone(),
        env!("CARGO_PKG_VERSION").to_string(),
        config.verify_timeout(),
    );

    let registry = web::Data::new(Registry::new(
        DirectoryStore::new(),
        Arc::new(verifier),
        Arc::new(SystemClock),
        config.server_timeout_secs,
    ));

    let rate_limiters = web::Data::new(RateLimiters::from_config(&config));

    info!("Starting server directory on {}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .app_data(rate_limiters.clone())
            .configure(handlers::routes)
    })
    .bind(&bind)?
    .run()
    .await
}
