// src/handlers/mod.rs
pub mod index;
pub mod servers;

use std::net::IpAddr;

use actix_web::web;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::RateLimiter;

use crate::config::Config;

/// The full HTTP surface. Shared between the binary and the API tests so
/// they cannot drift apart.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index::index)).service(
        web::scope("/servers")
            .route("", web::get().to(servers::get_servers))
            .route("", web::post().to(servers::register_server))
            .route("/{id}", web::get().to(servers::get_server_by_id))
            .route("/{id}", web::put().to(servers::update_server))
            .route("/{id}", web::post().to(servers::heartbeat))
            .route("/{id}", web::delete().to(servers::delete_server)),
    );
}

pub type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// One keyed limiter per traffic class, bundled so actix can hand them out
/// as a single piece of app data.
pub struct RateLimiters {
    pub mutation: IpRateLimiter,
    pub list: IpRateLimiter,
    pub delete: IpRateLimiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mutation: RateLimiter::keyed(config.mutation_quota()),
            list: RateLimiter::keyed(config.server_list_quota()),
            delete: RateLimiter::keyed(config.server_delete_quota()),
        }
    }
}
