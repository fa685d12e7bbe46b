// src/handlers/servers.rs
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error};

use crate::handlers::RateLimiters;
use crate::models::server::ServerDescription;
use crate::registry::Registry;
use crate::utils::{extract_peer_addr, RequestError};

pub async fn register_server(
    req: HttpRequest,
    registry: web::Data<Registry>,
    rate_limiters: web::Data<RateLimiters>,
    body: web::Json<ServerDescription>,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = extract_peer_addr(&req)?;

    if rate_limiters.mutation.check_key(&peer_ip).is_err() {
        error!("Rate limit exceeded for registration for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let entry = registry.register(body.into_inner(), peer_ip).await?;

    Ok(HttpResponse::Created()
        .append_header((
            header::LOCATION,
            format!("/servers/{}", entry.endpoint()),
        ))
        .json(entry))
}

pub async fn get_servers(
    req: HttpRequest,
    registry: web::Data<Registry>,
    rate_limiters: web::Data<RateLimiters>,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = extract_peer_addr(&req)?;

    if rate_limiters.list.check_key(&peer_ip).is_err() {
        error!("Rate limit exceeded for server list for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let servers = registry.list();
    debug!("Returning server list with {} servers", servers.len());
    Ok(HttpResponse::Ok().json(servers))
}

pub async fn get_server_by_id(
    registry: web::Data<Registry>,
    path: web::Path<String>,
) -> Result<HttpResponse, RequestError> {
    let entry = registry.get_by_id(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(entry))
}

pub async fn update_server(
    req: HttpRequest,
    registry: web::Data<Registry>,
    rate_limiters: web::Data<RateLimiters>,
    path: web::Path<String>,
    body: web::Json<ServerDescription>,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = extract_peer_addr(&req)?;

    if rate_limiters.mutation.check_key(&peer_ip).is_err() {
        error!("Rate limit exceeded for update for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let entry = registry.update(&path.into_inner(), body.into_inner(), peer_ip)?;
    Ok(HttpResponse::Ok().json(entry))
}

/// Heartbeats carry no body; they only refresh the liveness stamp.
pub async fn heartbeat(
    req: HttpRequest,
    registry: web::Data<Registry>,
    rate_limiters: web::Data<RateLimiters>,
    path: web::Path<String>,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = extract_peer_addr(&req)?;

    if rate_limiters.mutation.check_key(&peer_ip).is_err() {
        error!("Rate limit exceeded for heartbeat for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    registry.heartbeat(&path.into_inner(), peer_ip)?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn delete_server(
    req: HttpRequest,
    registry: web::Data<Registry>,
    rate_limiters: web::Data<RateLimiters>,
    path: web::Path<String>,
) -> Result<HttpResponse, RequestError> {
    let peer_ip = extract_peer_addr(&req)?;

    if rate_limiters.delete.check_key(&peer_ip).is_err() {
        error!("Rate limit exceeded for server delete for ip: {}", peer_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    registry.delete(&path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
