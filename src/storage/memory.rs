// src/storage/memory.rs
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::server::{Endpoint, ServerEntry};

/// In-process directory of registered servers, keyed by (address, queryPort).
/// DashMap gives per-key serialization of concurrent mutations; no cross-key
/// transactions are offered or needed.
pub struct DirectoryStore {
    servers: DashMap<Endpoint, ServerEntry>,
}

impl DirectoryStore {
    pub fn new() -> Self {
        Self {
            servers: DashMap::new(),
        }
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<ServerEntry> {
        self.servers.get(endpoint).map(|r| r.value().clone())
    }

    /// Insert-only. Returns false without touching the map if the key is
    /// already present.
    pub fn insert_new(&self, entry: ServerEntry) -> bool {
        match self.servers.entry(entry.endpoint()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    /// Mutates an existing entry under its key lock. Returns false if the
    /// key is absent.
    pub fn update_with<F>(&self, endpoint: &Endpoint, f: F) -> bool
    where
        F: FnOnce(&mut ServerEntry),
    {
        match self.servers.get_mut(endpoint) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, endpoint: &Endpoint) -> bool {
        self.servers.remove(endpoint).is_some()
    }

    /// Snapshot of all entries at call time.
    pub fn list_all(&self) -> Vec<ServerEntry> {
        self.servers.iter().map(|r| r.value().clone()).collect()
    }

    /// Drops every entry whose `last_update` is more than `timeout_secs`
    /// behind `now`. A heartbeat racing the sweep either lands before the
    /// entry's shard is visited (and saves it) or after (and the bump is
    /// seen by the next sweep); either way the outcome is per-key
    /// deterministic.
    pub fn evict_stale(&self, now: u64, timeout_secs: u64) {
        self.servers
            .retain(|_, server| now.saturating_sub(server.last_update) <= timeout_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::server::ServerDescription;

    fn entry(address: &str, port: u16, last_update: u64) -> ServerEntry {
        ServerDescription {
            address: None,
            query_port: None,
            game_port: 27015,
            name: format!("server-{}", port),
            tag_line: None,
            players: 0,
            max_players: None,
            round_status: "playing".to_string(),
            round_start_time: last_update,
            map: None,
            gamemode: None,
            game: "SS3D".to_string(),
            branch: None,
            version: None,
        }
        .into_entry(
            Endpoint::new(address.parse().unwrap(), port),
            last_update,
        )
    }

    #[test]
    fn insert_new_rejects_duplicate_key() {
        let store = DirectoryStore::new();
        assert!(store.insert_new(entry("127.0.0.1", 100, 0)));
        assert!(!store.insert_new(entry("127.0.0.1", 100, 0)));
        // Same address, different port is a different key.
        assert!(store.insert_new(entry("127.0.0.1", 200, 0)));
        assert_eq!(store.list_all().len(), 2);
    }

    #[test]
    fn update_with_requires_existing_key() {
        let store = DirectoryStore::new();
        let endpoint = Endpoint::new("127.0.0.1".parse().unwrap(), 100);
        assert!(!store.update_with(&endpoint, |e| e.last_update = 5));

        store.insert_new(entry("127.0.0.1", 100, 0));
        assert!(store.update_with(&endpoint, |e| e.last_update = 5));
        assert_eq!(store.get(&endpoint).unwrap().last_update, 5);
    }

    #[test]
    fn evict_stale_keeps_entries_on_the_boundary() {
        let store = DirectoryStore::new();
        store.insert_new(entry("127.0.0.1", 100, 1000));
        store.insert_new(entry("127.0.0.2", 200, 700));
        store.insert_new(entry("127.0.0.3", 300, 699));

        // Timeout of 300s at t=1000: 700 is exactly on the window edge and
        // survives, 699 does not.
        store.evict_stale(1000, 300);
        let names: Vec<String> = store.list_all().into_iter().map(|e| e.name).collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&"server-300".to_string()));
    }

    #[test]
    fn remove_reports_absence() {
        let store = DirectoryStore::new();
        let endpoint = Endpoint::new("127.0.0.1".parse().unwrap(), 100);
        assert!(!store.remove(&endpoint));
        store.insert_new(entry("127.0.0.1", 100, 0));
        assert!(store.remove(&endpoint));
        assert!(store.get(&endpoint).is_none());
    }
}
