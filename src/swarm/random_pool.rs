//! The process-wide `RandomPool` (`spec.md` §3, §4.3): a set of service
//! nodes bootstrapped once from the seed pool, refreshed whenever it runs
//! dry. Never empty once populated except transiently during a refresh.
use crate::config::NetworkConfig;
use crate::error::{NetworkError, Result};
use crate::http::{self, Verb};
use crate::node::ServiceNode;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::rngs::OsRng;
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, warn};

pub struct RandomPool {
    nodes: RwLock<HashSet<ServiceNode>>,
}

impl Default for RandomPool {
    fn default() -> Self {
        Self {
            nodes: RwLock::new(HashSet::new()),
        }
    }
}

impl RandomPool {
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<ServiceNode> {
        self.nodes.read().iter().cloned().collect()
    }

    /// Picks a uniformly random member, bootstrapping first if the pool is
    /// currently empty.
    pub async fn random_member(&self, seed_client: &reqwest::Client, config: &NetworkConfig) -> Result<ServiceNode> {
        if self.is_empty() {
            self.bootstrap(seed_client, config).await?;
        }
        let snapshot = self.snapshot();
        snapshot
            .choose(&mut OsRng)
            .cloned()
            .ok_or_else(|| NetworkError::Generic("random pool empty after bootstrap".into()))
    }

    pub fn remove(&self, target: &ServiceNode) {
        self.nodes.write().remove(target);
    }

    pub fn insert_all(&self, nodes: impl IntoIterator<Item = ServiceNode>) {
        self.nodes.write().extend(nodes);
    }

    /// Picks a uniformly random seed from the configured seed list and
    /// fetches a fresh member list via `get_n_service_nodes`
    /// (`spec.md` §4.3, §6 "Seed RPC").
    pub async fn bootstrap(&self, seed_client: &reqwest::Client, config: &NetworkConfig) -> Result<()> {
        let seed = config
            .seed_nodes
            .choose(&mut OsRng)
            .ok_or_else(|| NetworkError::Generic("no seed nodes configured".into()))?;

        debug!(seed = %seed, "bootstrapping random pool");

        let url = format!("{seed}/json_rpc");
        let params = json!({
            "method": "get_n_service_nodes",
            "params": {
                "active_only": true,
                "limit": crate::config::RANDOM_POOL_FETCH_LIMIT,
                "fields": { "public_ip": true, "storage_port": true }
            }
        });

        let response = http::execute(seed_client, Verb::Post, &url, Some(params), None, &[]).await?;

        let states = response
            .get("result")
            .and_then(|r| r.get("service_node_states"))
            .and_then(|s| s.as_array())
            .ok_or_else(|| NetworkError::ParsingFailed("missing result.service_node_states".into()))?;

        let nodes: Vec<ServiceNode> = states
            .iter()
            .filter_map(|entry| {
                let ip = entry.get("public_ip")?.as_str()?;
                let port = entry.get("storage_port")?.as_u64()? as u16;
                Some(ServiceNode::new(format!("https://{ip}"), port))
            })
            .filter(|node| !node.is_unroutable())
            .collect();

        if nodes.is_empty() {
            warn!("seed returned no usable service nodes");
            return Err(NetworkError::Generic("get_n_service_nodes returned no nodes".into()));
        }

        self.nodes.write().extend(nodes);
        Ok(())
    }
}
