//! Per-public-key swarm cache and target selection (`spec.md` §3 "Swarm",
//! §4.3 "getSwarm", "Target selection").
use crate::config::NetworkConfig;
use crate::difficulty::DifficultyState;
use crate::error::{NetworkError, Result};
use crate::node::ServiceNode;
use crate::retry::retry_with;
use crate::rpc::{self, RpcDeps};
use crate::storage::SwarmCacheStorage;
use crate::swarm::failure::FailureTable;
use crate::swarm::random_pool::RandomPool;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

pub struct SwarmDiscovery {
    pub random_pool: RandomPool,
    storage: Arc<dyn SwarmCacheStorage>,
}

impl SwarmDiscovery {
    pub fn new(storage: Arc<dyn SwarmCacheStorage>) -> Self {
        Self {
            random_pool: RandomPool::default(),
            storage,
        }
    }

    /// Returns the persisted swarm for `public_key` if it already meets the
    /// minimum size, otherwise bootstraps one random service node and calls
    /// `GetSwarm` to refresh it, routed through the same status-code policy
    /// (`rpc::call`) every other storage RPC uses.
    pub async fn get_swarm(
        &self,
        public_key: &str,
        seed_client: &reqwest::Client,
        snode_client: &reqwest::Client,
        failure: &FailureTable,
        difficulty: &DifficultyState,
        config: &NetworkConfig,
    ) -> Result<HashSet<ServiceNode>> {
        if let Some(swarm) = self.storage.get_swarm_cache(public_key).await {
            if swarm.len() >= config.minimum_snode_count {
                return Ok(swarm);
            }
        }

        let node = self.random_pool.random_member(seed_client, config).await?;
        let response = retry_with(config.max_retry_count, |_attempt| async {
            let deps = RpcDeps {
                client: snode_client,
                failure,
                swarm: self,
                difficulty,
            };
            rpc::call(&deps, public_key, &node, rpc::METHOD_GET_SWARM, json!({ "pubKey": public_key }), None, &[]).await
        })
        .await?;

        let snodes = response
            .get("result")
            .and_then(|r| r.get("snodes"))
            .and_then(|s| s.as_array())
            .ok_or_else(|| NetworkError::ParsingFailed("missing result.snodes".into()))?;

        let swarm: HashSet<ServiceNode> = snodes
            .iter()
            .filter_map(|entry| {
                let ip = entry.get("ip")?.as_str()?;
                let port = crate::numeric::as_u16(entry.get("port")?)?;
                Some(ServiceNode::new(format!("https://{ip}"), port))
            })
            .filter(|node| !node.is_unroutable())
            .collect();

        self.storage.set_swarm_cache(public_key, swarm.clone()).await;
        Ok(swarm)
    }

    /// Removes `target` from the swarm cache of `public_key` (421 handling,
    /// `spec.md` §4.2) and, separately, from the random pool.
    pub async fn evict_from_swarm(&self, public_key: &str, target: &ServiceNode) {
        if let Some(mut swarm) = self.storage.get_swarm_cache(public_key).await {
            swarm.remove(target);
            self.storage.set_swarm_cache(public_key, swarm).await;
        }
    }

    /// Cryptographically shuffled pick of a single swarm member.
    pub fn single_target(swarm: &HashSet<ServiceNode>) -> Option<ServiceNode> {
        let mut nodes: Vec<ServiceNode> = swarm.iter().cloned().collect();
        nodes.shuffle(&mut OsRng);
        nodes.into_iter().next()
    }

    /// Cryptographically shuffled prefix of `count` swarm members.
    pub fn target_snodes(swarm: &HashSet<ServiceNode>, count: usize) -> Vec<ServiceNode> {
        let mut nodes: Vec<ServiceNode> = swarm.iter().cloned().collect();
        nodes.shuffle(&mut OsRng);
        nodes.truncate(count);
        nodes
    }
}
