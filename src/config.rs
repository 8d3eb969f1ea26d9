use std::time::Duration;

/// The compile-time seed node list (`spec.md` §6, "Environment"). Overridable
/// via `SWARM_NETCORE_SEED_NODES` (comma-separated) for local/dev swarms,
/// mirroring the teacher crate's `AX_EVENT_SERVICE_URI` env-override pattern.
pub const DEFAULT_SEED_NODES: &[&str] = &[
    "https://seed1.getsession.org:443",
    "https://seed2.getsession.org:443",
    "https://seed3.getsession.org:443",
];

pub const MINIMUM_SNODE_COUNT: usize = 2;
pub const TARGET_SNODE_COUNT: usize = 3;
pub const FAILURE_THRESHOLD: u32 = 2;
pub const MAX_RETRY_COUNT: usize = 8;
pub const INITIAL_DIFFICULTY: u64 = 40;
pub const RANDOM_POOL_FETCH_LIMIT: u32 = 24;

/// Tunables threaded through `NetworkContext`. Defaults match the constants
/// above; construct with `NetworkConfig::from_env` to pick up a local swarm
/// for development without rebuilding.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub seed_nodes: Vec<String>,
    pub connect_timeout: Duration,
    pub default_timeout: Duration,
    pub long_poll_timeout: Duration,
    pub minimum_snode_count: usize,
    pub target_snode_count: usize,
    pub failure_threshold: u32,
    pub max_retry_count: usize,
    pub initial_difficulty: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            seed_nodes: DEFAULT_SEED_NODES.iter().map(|s| s.to_string()).collect(),
            connect_timeout: Duration::from_secs(20),
            default_timeout: Duration::from_secs(20),
            long_poll_timeout: Duration::from_secs(40),
            minimum_snode_count: MINIMUM_SNODE_COUNT,
            target_snode_count: TARGET_SNODE_COUNT,
            failure_threshold: FAILURE_THRESHOLD,
            max_retry_count: MAX_RETRY_COUNT,
            initial_difficulty: INITIAL_DIFFICULTY,
        }
    }
}

impl NetworkConfig {
    /// Reads `SWARM_NETCORE_SEED_NODES` (comma-separated URLs) if present,
    /// otherwise falls back to the compile-time seed list.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("SWARM_NETCORE_SEED_NODES") {
            let seeds: Vec<String> = value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
            if !seeds.is_empty() {
                config.seed_nodes = seeds;
            }
        }
        config
    }
}
