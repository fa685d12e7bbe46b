// src/registry.rs
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, error, info};

use crate::auth::source_is_server;
use crate::models::server::{Endpoint, ServerDescription, ServerEntry};
use crate::storage::memory::DirectoryStore;
use crate::utils::RequestError;
use crate::verify::ServerVerifier;

/// Time source for `last_update` stamps and eviction decisions. Injected so
/// eviction-boundary tests are deterministic instead of wall-clock bound.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }
}

/// Orchestrates the directory: admission control, liveness, and lazy
/// eviction. Entries have no stored state machine; liveness is a predicate
/// over `last_update` evaluated at read time.
pub struct Registry {
    store: DirectoryStore,
    verifier: Arc<dyn ServerVerifier>,
    clock: Arc<dyn Clock>,
    timeout_secs: u64,
}

impl Registry {
    pub fn new(
        store: DirectoryStore,
        verifier: Arc<dyn ServerVerifier>,
        clock: Arc<dyn Clock>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            store,
            verifier,
            clock,
            timeout_secs,
        }
    }

    fn parse_id(id: &str) -> Result<Endpoint, RequestError> {
        Endpoint::from_str(id)
            .map_err(|_| RequestError::BadRequest("Id is not of valid address:port format".into()))
    }

    fn is_stale(&self, entry: &ServerEntry, now: u64) -> bool {
        now.saturating_sub(entry.last_update) > self.timeout_secs
    }

    /// Admits a new server. The claimed address falls back to the peer when
    /// absent; the source must match it and the candidate must answer the
    /// challenge probe. The probe runs without any store lock held, so the
    /// key is checked both before and after it.
    pub async fn register(
        &self,
        desc: ServerDescription,
        peer: IpAddr,
    ) -> Result<ServerEntry, RequestError> {
        desc.validate().map_err(RequestError::BadRequest)?;

        let address = match &desc.address {
            Some(address) => address
                .parse::<IpAddr>()
                .map_err(|_| RequestError::BadRequest("Invalid address".into()))?,
            None => peer,
        };
        let query_port = desc
            .query_port
            .ok_or_else(|| RequestError::BadRequest("queryPort is required".into()))?;
        let endpoint = Endpoint::new(address, query_port);

        info!("Game server located at {}", endpoint);

        // Source check first, to stop cheap spoofed registrations before we
        // spend a network round-trip on them.
        if !source_is_server(&endpoint, peer) {
            error!("Registration source {} does not match claimed {}", peer, endpoint);
            return Err(RequestError::Forbidden);
        }

        if self.store.get(&endpoint).is_some() {
            return Err(RequestError::Conflict);
        }

        if !self.verifier.verify(&endpoint).await {
            error!("Challenge verification failed for {}", endpoint);
            return Err(RequestError::FailedDependency);
        }

        let entry = desc.into_entry(endpoint, self.clock.now_unix());
        // A concurrent registration may have won the race during the probe.
        if !self.store.insert_new(entry.clone()) {
            return Err(RequestError::Conflict);
        }

        debug!("Registered server {} at {}", entry.name, endpoint);
        Ok(entry)
    }

    /// Replaces every mutable field of an existing entry and bumps
    /// `last_update`. Key fields in the payload, when present, must equal
    /// the key in the id; the stored key is never changed.
    pub fn update(
        &self,
        id: &str,
        desc: ServerDescription,
        peer: IpAddr,
    ) -> Result<ServerEntry, RequestError> {
        let endpoint = Self::parse_id(id)?;

        if !source_is_server(&endpoint, peer) {
            return Err(RequestError::Forbidden);
        }

        desc.validate().map_err(RequestError::BadRequest)?;

        if let Some(address) = &desc.address {
            let claimed = address
                .parse::<IpAddr>()
                .map_err(|_| RequestError::BadRequest("Invalid address".into()))?;
            if claimed != endpoint.address {
                return Err(RequestError::BadRequest(
                    "Cannot modify address or query port".into(),
                ));
            }
        }
        if let Some(port) = desc.query_port {
            if port != endpoint.query_port {
                return Err(RequestError::BadRequest(
                    "Cannot modify address or query port".into(),
                ));
            }
        }

        let mut replacement = desc.into_entry(endpoint, self.clock.now_unix());
        let mut updated = None;
        let found = self.store.update_with(&endpoint, |entry| {
            // last_update never moves backwards, even across a clock skew.
            replacement.last_update = replacement.last_update.max(entry.last_update);
            *entry = replacement;
            updated = Some(entry.clone());
        });
        if !found {
            return Err(RequestError::NotFound);
        }

        debug!("Updated server at {}", endpoint);
        Ok(updated.unwrap())
    }

    /// Refreshes liveness without touching any descriptive field.
    pub fn heartbeat(&self, id: &str, peer: IpAddr) -> Result<(), RequestError> {
        let endpoint = Self::parse_id(id)?;

        if !source_is_server(&endpoint, peer) {
            return Err(RequestError::Forbidden);
        }

        let now = self.clock.now_unix();
        if !self.store.update_with(&endpoint, |entry| {
            entry.last_update = entry.last_update.max(now);
        }) {
            return Err(RequestError::NotFound);
        }

        debug!("Heartbeat from {}", endpoint);
        Ok(())
    }

    /// Sweeps out entries past the timeout, then snapshots the rest.
    pub fn list(&self) -> Vec<ServerEntry> {
        self.store
            .evict_stale(self.clock.now_unix(), self.timeout_secs);
        self.store.list_all()
    }

    /// An entry past the timeout is reported absent even before a list
    /// sweep has physically removed it.
    pub fn get_by_id(&self, id: &str) -> Result<ServerEntry, RequestError> {
        let endpoint = Self::parse_id(id)?;

        let entry = self.store.get(&endpoint).ok_or(RequestError::NotFound)?;
        if self.is_stale(&entry, self.clock.now_unix()) {
            return Err(RequestError::NotFound);
        }
        Ok(entry)
    }

    pub fn delete(&self, id: &str) -> Result<(), RequestError> {
        let endpoint = Self::parse_id(id)?;

        if !self.store.remove(&endpoint) {
            return Err(RequestError::NotFound);
        }
        debug!("Removed server at {}", endpoint);
        Ok(())
    }
}
