//! The shared, process-wide services threaded through every call
//! (`spec.md` §9 "Global mutable state → explicit shared services"). All of
//! `RandomPool`, `FailureTable`, `DifficultyState`, the open-group
//! moderators cache, and the in-flight auth-challenge map live here as
//! fields rather than file-level statics, each behind its own lock.
use crate::config::NetworkConfig;
use crate::difficulty::DifficultyState;
use crate::http;
use crate::opengroup::auth::AuthCoordinator;
use crate::storage::{AuthTokenStorage, LastMessageHashStorage, OpenGroupCursorStorage, PeerStore, ReceivedMessageHashStorage, SwarmCacheStorage};
use crate::swarm::{FailureTable, SwarmDiscovery};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A single, long-lived value shared across every call an embedding
/// application makes into this crate. Construct once and clone freely —
/// everything inside is `Arc`-shared, so clones are cheap handles, not
/// copies.
#[derive(Clone)]
pub struct NetworkContext {
    pub config: NetworkConfig,
    pub seed_client: reqwest::Client,
    pub snode_client: reqwest::Client,
    pub swarm: Arc<SwarmDiscovery>,
    pub failure: Arc<FailureTable>,
    pub difficulty: Arc<DifficultyState>,
    pub auth: Arc<AuthCoordinator>,
    /// `(server, channel) -> moderator public keys`, refreshed on demand by
    /// `opengroup::client::get_moderators`.
    pub moderators: Arc<Mutex<HashMap<(String, i64), Vec<String>>>>,
    pub storage: Arc<dyn FullStorage>,
    /// Bounds outbound HTTP concurrency (`spec.md` §5 "network" executor).
    pub network_permits: Arc<Semaphore>,
    /// Bounds CPU-bound post-processing — parsing, signature verification,
    /// proof-of-work (`spec.md` §5 "work" executor).
    pub work_permits: Arc<Semaphore>,
}

/// Every storage trait bundled behind one object so `NetworkContext` needs
/// only a single `Arc`. An embedding application implements all of these on
/// one concrete type (see `storage::in_memory::InMemoryStorage` for a
/// reference implementation used in tests).
pub trait FullStorage:
    SwarmCacheStorage + AuthTokenStorage + LastMessageHashStorage + ReceivedMessageHashStorage + OpenGroupCursorStorage + PeerStore
{
}
impl<T> FullStorage for T where
    T: SwarmCacheStorage + AuthTokenStorage + LastMessageHashStorage + ReceivedMessageHashStorage + OpenGroupCursorStorage + PeerStore
{
}

const NETWORK_CONCURRENCY: usize = 8;
const WORK_CONCURRENCY: usize = 8;

impl NetworkContext {
    pub fn new(config: NetworkConfig, storage: Arc<dyn FullStorage>) -> Self {
        Self {
            swarm: Arc::new(SwarmDiscovery::new(storage.clone())),
            failure: Arc::new(FailureTable::new(config.failure_threshold)),
            difficulty: Arc::new(DifficultyState::new(config.initial_difficulty)),
            auth: Arc::new(AuthCoordinator::default()),
            moderators: Arc::new(Mutex::new(HashMap::new())),
            seed_client: http::build_seed_client(),
            snode_client: http::build_snode_client(),
            storage,
            network_permits: Arc::new(Semaphore::new(NETWORK_CONCURRENCY)),
            work_permits: Arc::new(Semaphore::new(WORK_CONCURRENCY)),
            config,
        }
    }
}
