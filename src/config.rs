use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;

const DEFAULT_MUTATION_PERIOD_SECS: u64 = 10;
const DEFAULT_MUTATION_BURST_LIMIT: u32 = 30;
const DEFAULT_SERVER_LIST_PERIOD_SECS: u64 = 1;
const DEFAULT_SERVER_LIST_BURST_LIMIT: u32 = 60;
const DEFAULT_SERVER_DELETE_PERIOD_SECS: u64 = 5;
const DEFAULT_SERVER_DELETE_BURST_LIMIT: u32 = 10;
const DEFAULT_SERVER_TIMEOUT_SECS: u64 = 300; // 5 minutes
const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 5;

#[derive(Clone)]
pub struct Config {
    // Rate limiting configs
    pub mutation_period_secs: u64,
    pub mutation_burst_limit: u32,
    pub server_list_period_secs: u64,
    pub server_list_burst_limit: u32,
    pub server_delete_period_secs: u64,
    pub server_delete_burst_limit: u32,

    // Liveness window; entries silent for longer are evicted.
    pub server_timeout_secs: u64,

    // Outbound challenge probe
    pub verify_timeout_secs: u64,
    /// Host name advertised to candidates in the probe query string.
    pub master_host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mutation_period_secs: DEFAULT_MUTATION_PERIOD_SECS,
            mutation_burst_limit: DEFAULT_MUTATION_BURST_LIMIT,
            server_list_period_secs: DEFAULT_SERVER_LIST_PERIOD_SECS,
            server_list_burst_limit: DEFAULT_SERVER_LIST_BURST_LIMIT,
            server_delete_period_secs: DEFAULT_SERVER_DELETE_PERIOD_SECS,
            server_delete_burst_limit: DEFAULT_SERVER_DELETE_BURST_LIMIT,
            server_timeout_secs: DEFAULT_SERVER_TIMEOUT_SECS,
            verify_timeout_secs: DEFAULT_VERIFY_TIMEOUT_SECS,
            master_host: "localhost".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mutation_period_secs: env::var("MUTATION_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MUTATION_PERIOD_SECS),

            mutation_burst_limit: env::var("MUTATION_BURST_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MUTATION_BURST_LIMIT),

            server_list_period_secs: env::var("SERVER_LIST_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_LIST_PERIOD_SECS),

            server_list_burst_limit: env::var("SERVER_LIST_BURST_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_LIST_BURST_LIMIT),

            server_delete_period_secs: env::var("SERVER_DELETE_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_DELETE_PERIOD_SECS),

            server_delete_burst_limit: env::var("SERVER_DELETE_BURST_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_DELETE_BURST_LIMIT),

            server_timeout_secs: env::var("SERVER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_TIMEOUT_SECS),

            verify_timeout_secs: env::var("VERIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_VERIFY_TIMEOUT_SECS),

            master_host: env::var("MASTER_HOST").unwrap_or_else(|_| "localhost".to_string()),
        }
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    pub fn mutation_quota(&self) -> Quota {
        Self::quota(
            self.mutation_period_secs,
            DEFAULT_MUTATION_PERIOD_SECS,
            self.mutation_burst_limit,
            DEFAULT_MUTATION_BURST_LIMIT,
        )
    }

    pub fn server_list_quota(&self) -> Quota {
        Self::quota(
            self.server_list_period_secs,
            DEFAULT_SERVER_LIST_PERIOD_SECS,
            self.server_list_burst_limit,
            DEFAULT_SERVER_LIST_BURST_LIMIT,
        )
    }

    pub fn server_delete_quota(&self) -> Quota {
        Self::quota(
            self.server_delete_period_secs,
            DEFAULT_SERVER_DELETE_PERIOD_SECS,
            self.server_delete_burst_limit,
            DEFAULT_SERVER_DELETE_BURST_LIMIT,
        )
    }

    /// governor rejects a zero period or burst; a zero from the environment
    /// falls back to the default instead of taking the process down.
    fn quota(period_secs: u64, default_period_secs: u64, burst: u32, default_burst: u32) -> Quota {
        let period_secs = if period_secs == 0 {
            default_period_secs
        } else {
            period_secs
        };
        let burst = NonZeroU32::new(burst)
            .or_else(|| NonZeroU32::new(default_burst))
            .expect("default burst limits are non-zero");
        Quota::with_period(Duration::from_secs(period_secs))
            .expect("default periods are non-zero")
            .allow_burst(burst)
    }
}
