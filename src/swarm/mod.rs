//! Swarm discovery (`spec.md` §4.3): a process-wide random pool of service
//! nodes bootstrapped from seeds, and per-public-key swarm caches with
//! target selection for outbound calls.
pub mod cache;
pub mod failure;
pub mod random_pool;

pub use cache::SwarmDiscovery;
pub use failure::FailureTable;
pub use random_pool::RandomPool;
