// src/models/server.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Composite primary key of a registered server: the address and query port
/// the directory uses to reach it for verification and management calls.
/// Never mutated after registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub address: IpAddr,
    pub query_port: u16,
}

impl Endpoint {
    pub fn new(address: IpAddr, query_port: u16) -> Self {
        Self { address, query_port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SocketAddr handles the bracketed IPv6 form
        SocketAddr::new(self.address, self.query_port).fmt(f)
    }
}

impl FromStr for Endpoint {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr: SocketAddr = s.parse()?;
        Ok(Self::new(addr.ip(), addr.port()))
    }
}

/// One registered game server. `address` and `query_port` together form the
/// immutable key; everything else is replaced wholesale on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEntry {
    pub address: IpAddr,
    /// Port the directory queries for verification and management.
    pub query_port: u16,
    /// Port players connect to.
    pub game_port: u16,
    pub name: String,
    pub tag_line: Option<String>,
    pub players: u32,
    /// -1 means unlimited.
    pub max_players: Option<i32>,
    /// Conventionally one of "restarting" | "lobby" | "playing".
    pub round_status: String,
    /// Unix seconds of the last round-status change.
    pub round_start_time: u64,
    pub map: Option<String>,
    pub gamemode: Option<String>,
    pub game: String,
    pub branch: Option<String>,
    pub version: Option<String>,
    /// Unix seconds, bumped on every successful update/heartbeat. Drives eviction.
    pub last_update: u64,
}

impl ServerEntry {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.address, self.query_port)
    }
}

/// Client-submitted server description, used for both registration and
/// update. `address` and `query_port` are optional: registration falls back
/// to the connection's peer address, updates fall back to the id in the URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescription {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub query_port: Option<u16>,
    pub game_port: u16,
    pub name: String,
    #[serde(default)]
    pub tag_line: Option<String>,
    #[serde(default)]
    pub players: u32,
    #[serde(default)]
    pub max_players: Option<i32>,
    pub round_status: String,
    pub round_start_time: u64,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub gamemode: Option<String>,
    pub game: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ServerDescription {
    /// Field checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Invalid name: must be at least 1 char".to_string());
        }
        if self.name.len() > 64 {
            return Err("Invalid name: too long (max 64 chars)".to_string());
        }
        if self.round_status.is_empty() {
            return Err("Invalid roundStatus: must be at least 1 char".to_string());
        }
        if self.game.is_empty() {
            return Err("Invalid game: must be at least 1 char".to_string());
        }
        if self.game_port == 0 {
            return Err("Invalid gamePort: must be non-zero".to_string());
        }
        if let Some(max) = self.max_players {
            if max < -1 {
                return Err("Invalid maxPlayers: must be -1 (unlimited) or above".to_string());
            }
        }
        Ok(())
    }

    /// Builds the stored entry for the given key, stamping `last_update`.
    pub fn into_entry(self, endpoint: Endpoint, now: u64) -> ServerEntry {
        ServerEntry {
            address: endpoint.address,
            query_port: endpoint.query_port,
            game_port: self.game_port,
            name: self.name,
            tag_line: self.tag_line,
            players: self.players,
            max_players: self.max_players,
            round_status: self.round_status,
            round_start_time: self.round_start_time,
            map: self.map,
            gamemode: self.gamemode,
            game: self.game,
            branch: self.branch,
            version: self.version,
            last_update: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(name: &str) -> ServerDescription {
        ServerDescription {
            address: None,
            query_port: None,
            game_port: 27015,
            name: name.to_string(),
            tag_line: None,
            players: 0,
            max_players: Some(16),
            round_status: "lobby".to_string(),
            round_start_time: 1000,
            map: None,
            gamemode: None,
            game: "SS3D".to_string(),
            branch: None,
            version: None,
        }
    }

    #[test]
    fn endpoint_round_trips_through_string_form() {
        let endpoint: Endpoint = "10.0.0.5:27500".parse().unwrap();
        assert_eq!(endpoint.query_port, 27500);
        assert_eq!(endpoint.to_string(), "10.0.0.5:27500");

        let v6: Endpoint = "[2001:db8::1]:100".parse().unwrap();
        assert_eq!(v6.to_string(), "[2001:db8::1]:100");
    }

    #[test]
    fn endpoint_rejects_garbage_ids() {
        assert!("not-an-endpoint".parse::<Endpoint>().is_err());
        assert!("10.0.0.5".parse::<Endpoint>().is_err());
        assert!("10.0.0.5:notaport".parse::<Endpoint>().is_err());
    }

    #[test]
    fn validate_rejects_empty_required_fields() {
        assert!(description("Alpha").validate().is_ok());
        assert!(description("").validate().is_err());

        let mut desc = description("Alpha");
        desc.round_status = String::new();
        assert!(desc.validate().is_err());

        let mut desc = description("Alpha");
        desc.game = String::new();
        assert!(desc.validate().is_err());

        let mut desc = description("Alpha");
        desc.max_players = Some(-2);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn into_entry_stamps_key_and_last_update() {
        let endpoint: Endpoint = "10.0.0.5:27500".parse().unwrap();
        let entry = description("Alpha").into_entry(endpoint, 4242);
        assert_eq!(entry.endpoint(), endpoint);
        assert_eq!(entry.last_update, 4242);
        assert_eq!(entry.name, "Alpha");
    }
}
