// src/utils.rs
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use std::fmt;
use std::net::IpAddr;

/// Terminal, locally-determined request outcomes. Nothing here is retried
/// internally and none of these are fatal to the process.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestError {
    /// Malformed endpoint id or payload.
    BadRequest(String),
    /// Claimed endpoint does not match the observed source address.
    Forbidden,
    /// Target entry does not exist or has been evicted.
    NotFound,
    /// Duplicate key on insert.
    Conflict,
    /// Candidate server could not be verified (unreachable, non-200, or
    /// wrong challenge).
    FailedDependency,
    /// Transport layer gave us no peer address.
    MissingPeerIp,
    RateLimitExceeded,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(reason) => write!(f, "{}", reason),
            Self::Forbidden => write!(f, "Claimed endpoint does not match request source"),
            Self::NotFound => write!(f, "Server not found"),
            Self::Conflict => write!(f, "A server with this endpoint is already registered"),
            Self::FailedDependency => write!(f, "Could not verify the game server"),
            Self::MissingPeerIp => write!(f, "Failed to extract client IP"),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
        }
    }
}

impl ResponseError for RequestError {
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Forbidden => HttpResponse::Forbidden().body(self.to_string()),
            Self::NotFound => HttpResponse::NotFound().body(self.to_string()),
            Self::Conflict => HttpResponse::Conflict().body(self.to_string()),
            Self::FailedDependency => {
                HttpResponse::build(StatusCode::FAILED_DEPENDENCY).body(self.to_string())
            }
            Self::RateLimitExceeded => HttpResponse::TooManyRequests().body(self.to_string()),
            _ => HttpResponse::BadRequest().body(self.to_string()),
        }
    }
}

/// The source address used for admission checks is the connection's peer,
/// supplied by the transport layer. No proxy headers are consulted; if this
/// directory is ever fronted by a proxy the authenticator breaks by design
/// rather than trusting spoofable headers.
pub fn extract_peer_addr(req: &HttpRequest) -> Result<IpAddr, RequestError> {
    match req.peer_addr() {
        Some(addr) => Ok(addr.ip()),
        None => Err(RequestError::MissingPeerIp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_responses_carry_the_right_status() {
        assert_eq!(
            RequestError::BadRequest("x".into())
                .error_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::Forbidden.error_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RequestError::NotFound.error_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RequestError::Conflict.error_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            RequestError::FailedDependency.error_response().status(),
            StatusCode::FAILED_DEPENDENCY
        );
        assert_eq!(
            RequestError::RateLimitExceeded.error_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
