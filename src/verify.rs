// src/verify.rs
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;

use crate::models::server::Endpoint;

/// Supplies challenge numbers for the verification probe. Injected so tests
/// can pin the value instead of pulling from a global RNG.
pub trait ChallengeSource: Send + Sync {
    fn next_challenge(&self) -> u32;
}

pub struct ThreadRngChallenge;

impl ChallengeSource for ThreadRngChallenge {
    fn next_challenge(&self) -> u32 {
        rand::thread_rng().gen()
    }
}

/// Admission-time check that the registering process actually controls an
/// HTTP endpoint at the claimed (address, queryPort).
#[async_trait]
pub trait ServerVerifier: Send + Sync {
    async fn verify(&self, endpoint: &Endpoint) -> bool;
}

/// Challenge-response prober: POSTs to `/connect` on the candidate's query
/// port and requires the random challenge echoed back in a JSON body.
pub struct HttpVerifier {
    client: reqwest::Client,
    challenges: Box<dyn ChallengeSource>,
    master_host: String,
    master_version: String,
}

impl HttpVerifier {
    pub fn new(
        challenges: Box<dyn ChallengeSource>,
        master_host: String,
        master_version: String,
        timeout: Duration,
    ) -> Self {
        // Construction happens once at startup; a client that cannot be
        // built is unrecoverable.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build verification http client");
        Self {
            client,
            challenges,
            master_host,
            master_version,
        }
    }
}

#[async_trait]
impl ServerVerifier for HttpVerifier {
    async fn verify(&self, endpoint: &Endpoint) -> bool {
        let challenge = self.challenges.next_challenge();
        let challenge_str = challenge.to_string();
        let url = format!("http://{}/connect", endpoint);

        let response = match self
            .client
            .post(&url)
            .query(&[
                ("master", self.master_host.as_str()),
                ("version", self.master_version.as_str()),
                ("challenge", challenge_str.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to connect to game server at {}: {}", endpoint, e);
                return false;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            warn!(
                "Received non-good response code {} from {}, not accepting connection",
                response.status(),
                endpoint
            );
            return false;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read challenge response from {}: {}", endpoint, e);
                return false;
            }
        };

        if !challenge_matches(&body, challenge) {
            warn!(
                "Challenge mismatch from {}, not accepting connection",
                endpoint
            );
            return false;
        }

        debug!("Verified game server at {}", endpoint);
        true
    }
}

/// A body that cannot be parsed, or that lacks a numeric `challenge` field,
/// counts as a mismatch. Never default to success here.
fn challenge_matches(body: &str, expected: u32) -> bool {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return false,
    };
    parsed.get("challenge").and_then(|v| v.as_u64()) == Some(u64::from(expected))
}
