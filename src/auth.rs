// src/auth.rs
use std::net::IpAddr;

use log::info;

use crate::models::server::Endpoint;

/// Checks that the endpoint a request claims to speak for matches the
/// connection it arrived on. Only the address is compared: NAT commonly
/// rewrites the outbound port, so the port carries no signal.
///
/// This is a weak check on its own. An attacker sharing the victim's public
/// address (e.g. behind the same NAT) passes it; the challenge probe in
/// `verify` is the stronger admission guard.
pub fn source_is_server(claimed: &Endpoint, peer: IpAddr) -> bool {
    info!("Connection coming from {}", peer);
    claimed.address == peer
}
