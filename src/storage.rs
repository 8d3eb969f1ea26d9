//! Abstract contracts for the host database (`spec.md` §6 "Persistence
//! contract", §9 "Abstract Storage Interfaces"). The on-device database
//! itself is out of scope; these traits are the seam an embedding
//! application implements, matching the teacher crate's habit of modeling
//! the host environment as an injected trait rather than a concrete store
//! (see `EventService` in `service/mod.rs` of the teacher).
use crate::node::{Peer, ServiceNode};
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait SwarmCacheStorage: Send + Sync {
    async fn get_swarm_cache(&self, public_key: &str) -> Option<HashSet<ServiceNode>>;
    async fn set_swarm_cache(&self, public_key: &str, swarm: HashSet<ServiceNode>);
}

#[async_trait]
pub trait AuthTokenStorage: Send + Sync {
    async fn get_auth_token(&self, server: &str) -> Option<String>;
    async fn set_auth_token(&self, server: &str, token: Option<String>);
}

#[async_trait]
pub trait LastMessageHashStorage: Send + Sync {
    async fn get_last_message_hash_value(&self, target: &ServiceNode) -> Option<String>;
    async fn set_last_message_hash_value(&self, target: &ServiceNode, hash: String);
}

#[async_trait]
pub trait ReceivedMessageHashStorage: Send + Sync {
    async fn get_received_message_hash_values(&self) -> HashSet<String>;
    async fn set_received_message_hash_values(&self, hashes: HashSet<String>);
}

#[async_trait]
pub trait OpenGroupCursorStorage: Send + Sync {
    async fn get_last_message_server_id(&self, channel: i64, server: &str) -> Option<i64>;
    async fn set_last_message_server_id(&self, channel: i64, server: &str, id: i64);
    async fn get_last_deletion_server_id(&self, channel: i64, server: &str) -> Option<i64>;
    async fn set_last_deletion_server_id(&self, channel: i64, server: &str, id: i64);
    async fn set_user_count(&self, channel: i64, server: &str, count: u64);
    async fn get_open_group_avatar_url(&self, channel: i64, server: &str) -> Option<String>;
    async fn set_open_group_avatar_url(&self, channel: i64, server: &str, url: Option<String>);
}

/// Stands in for the on-device database's peer table, backing the P2P fast
/// path of the send path (`spec.md` §4.4 step 2).
#[async_trait]
pub trait PeerStore: Send + Sync {
    async fn get_peer(&self, public_key: &str) -> Option<Peer>;
    async fn set_peer(&self, peer: Peer);
    async fn mark_online(&self, public_key: &str);
    async fn mark_offline(&self, public_key: &str);
}

/// An in-memory implementation of every storage trait, useful for tests and
/// for embedding applications that have not yet wired up real persistence.
/// Not exposed as the crate's default — callers are expected to provide
/// their own, durable implementation.
pub mod in_memory {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct InMemoryStorage {
        swarm_cache: Mutex<HashMap<String, HashSet<ServiceNode>>>,
        auth_tokens: Mutex<HashMap<String, String>>,
        last_message_hash: Mutex<HashMap<ServiceNode, String>>,
        received_hashes: Mutex<HashSet<String>>,
        last_message_server_id: Mutex<HashMap<(i64, String), i64>>,
        last_deletion_server_id: Mutex<HashMap<(i64, String), i64>>,
        user_counts: Mutex<HashMap<(i64, String), u64>>,
        avatar_urls: Mutex<HashMap<(i64, String), String>>,
        peers: Mutex<HashMap<String, Peer>>,
    }

    impl InMemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl SwarmCacheStorage for InMemoryStorage {
        async fn get_swarm_cache(&self, public_key: &str) -> Option<HashSet<ServiceNode>> {
            self.swarm_cache.lock().get(public_key).cloned()
        }

        async fn set_swarm_cache(&self, public_key: &str, swarm: HashSet<ServiceNode>) {
            self.swarm_cache.lock().insert(public_key.to_string(), swarm);
        }
    }

    #[async_trait]
    impl AuthTokenStorage for InMemoryStorage {
        async fn get_auth_token(&self, server: &str) -> Option<String> {
            self.auth_tokens.lock().get(server).cloned()
        }

        async fn set_auth_token(&self, server: &str, token: Option<String>) {
            let mut guard = self.auth_tokens.lock();
            match token {
                Some(token) => {
                    guard.insert(server.to_string(), token);
                }
                None => {
                    guard.remove(server);
                }
            }
        }
    }

    #[async_trait]
    impl LastMessageHashStorage for InMemoryStorage {
        async fn get_last_message_hash_value(&self, target: &ServiceNode) -> Option<String> {
            self.last_message_hash.lock().get(target).cloned()
        }

        async fn set_last_message_hash_value(&self, target: &ServiceNode, hash: String) {
            self.last_message_hash.lock().insert(target.clone(), hash);
        }
    }

    #[async_trait]
    impl ReceivedMessageHashStorage for InMemoryStorage {
        async fn get_received_message_hash_values(&self) -> HashSet<String> {
            self.received_hashes.lock().clone()
        }

        async fn set_received_message_hash_values(&self, hashes: HashSet<String>) {
            *self.received_hashes.lock() = hashes;
        }
    }

    #[async_trait]
    impl OpenGroupCursorStorage for InMemoryStorage {
        async fn get_last_message_server_id(&self, channel: i64, server: &str) -> Option<i64> {
            self.last_message_server_id.lock().get(&(channel, server.to_string())).copied()
        }

        async fn set_last_message_server_id(&self, channel: i64, server: &str, id: i64) {
            self.last_message_server_id.lock().insert((channel, server.to_string()), id);
        }

        async fn get_last_deletion_server_id(&self, channel: i64, server: &str) -> Option<i64> {
            self.last_deletion_server_id.lock().get(&(channel, server.to_string())).copied()
        }

        async fn set_last_deletion_server_id(&self, channel: i64, server: &str, id: i64) {
            self.last_deletion_server_id.lock().insert((channel, server.to_string()), id);
        }

        async fn set_user_count(&self, channel: i64, server: &str, count: u64) {
            self.user_counts.lock().insert((channel, server.to_string()), count);
        }

        async fn get_open_group_avatar_url(&self, channel: i64, server: &str) -> Option<String> {
            self.avatar_urls.lock().get(&(channel, server.to_string())).cloned()
        }

        async fn set_open_group_avatar_url(&self, channel: i64, server: &str, url: Option<String>) {
            let mut guard = self.avatar_urls.lock();
            let key = (channel, server.to_string());
            match url {
                Some(url) => {
                    guard.insert(key, url);
                }
                None => {
                    guard.remove(&key);
                }
            }
        }
    }

    #[async_trait]
    impl PeerStore for InMemoryStorage {
        async fn get_peer(&self, public_key: &str) -> Option<Peer> {
            self.peers.lock().get(public_key).cloned()
        }

        async fn set_peer(&self, peer: Peer) {
            self.peers.lock().insert(peer.public_key.clone(), peer);
        }

        async fn mark_online(&self, public_key: &str) {
            if let Some(peer) = self.peers.lock().get_mut(public_key) {
                peer.is_online = true;
            }
        }

        async fn mark_offline(&self, public_key: &str) {
            if let Some(peer) = self.peers.lock().get_mut(public_key) {
                peer.is_online = false;
            }
        }
    }
}
