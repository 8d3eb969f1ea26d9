use serde::{Deserialize, Serialize};
use std::fmt;

/// A storage RPC endpoint: `(address, port)`. The address is treated as an
/// opaque scheme-prefixed URI, never parsed for its own sake — equality and
/// hashing are by `(address, port)` per `spec.md` §3.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ServiceNode {
    pub address: String,
    pub port: u16,
}

impl ServiceNode {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// `0.0.0.0` entries are excluded everywhere a service node list is
    /// parsed (`spec.md` §4.3, §8 boundary behaviors).
    pub fn is_unroutable(&self) -> bool {
        self.address.contains("0.0.0.0")
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn storage_rpc_url(&self) -> String {
        format!("{}/storage_rpc/v1", self.base_url())
    }
}

impl PartialEq for ServiceNode {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.port == other.port
    }
}

impl std::hash::Hash for ServiceNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for ServiceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// A directly reachable peer for the P2P fast path of the send path
/// (`spec.md` §4.4 step 2). Tracking online/offline state here stands in for
/// the on-device database the spec models only through `storage::PeerStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub public_key: String,
    pub address: String,
    pub port: u16,
    pub is_online: bool,
}

impl Peer {
    pub fn target(&self) -> ServiceNode {
        ServiceNode::new(self.address.clone(), self.port)
    }
}
