//! Outbound domain message and wire conversion (`spec.md` §3, §4.4 step 1),
//! plus the `Envelope` the receive path hands back to the caller.
use crate::error::{NetworkError, Result};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// The default ping TTL: four days, matching the network's longest-lived
/// swarm replication window.
pub const PING_TTL_MILLIS: u64 = 4 * 24 * 60 * 60 * 1000;

/// A message queued for delivery to `destination`. `is_ping` marks the
/// lightweight P2P keepalive the send path prefers routing directly to an
/// online peer rather than through the swarm (`spec.md` §4.4 step 2).
#[derive(Debug, Clone)]
pub struct Message {
    pub destination: String,
    pub data: Vec<u8>,
    pub ttl_millis: u64,
    pub timestamp_millis: u64,
    pub is_ping: bool,
}

impl Message {
    pub fn new(destination: impl Into<String>, data: Vec<u8>, ttl_millis: u64) -> Self {
        Self {
            destination: destination.into(),
            data,
            ttl_millis,
            timestamp_millis: now_millis(),
            is_ping: false,
        }
    }

    pub fn ping(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            data: Vec::new(),
            ttl_millis: PING_TTL_MILLIS,
            timestamp_millis: now_millis(),
            is_ping: true,
        }
    }

    /// Converts to the wire form sent over the direct P2P fast path: a bare
    /// base64 envelope, no proof-of-work involved (`spec.md` §4.4 step 2).
    pub fn to_peer_wire(&self) -> Result<Value> {
        if self.destination.is_empty() {
            return Err(NetworkError::MessageConversionFailed("empty destination".into()));
        }
        Ok(json!({
            "data": base64::encode(&self.data),
            "ttl": self.ttl_millis,
            "timestamp": self.timestamp_millis,
            "pubKey": self.destination,
        }))
    }

    /// Converts to the `SendMessage` RPC params, with `nonce` filled in by
    /// the caller once proof-of-work has been computed (`spec.md` §6).
    pub fn to_swarm_wire(&self, nonce: &str) -> Result<Value> {
        if self.destination.is_empty() {
            return Err(NetworkError::MessageConversionFailed("empty destination".into()));
        }
        Ok(json!({
            "pubKey": self.destination,
            "data": base64::encode(&self.data),
            "ttl": self.ttl_millis.to_string(),
            "timestamp": self.timestamp_millis.to_string(),
            "nonce": nonce,
        }))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis() as u64
}

/// An opaque, end-to-end-encrypted payload handed back by the receive path
/// (GLOSSARY "Envelope"). Everything beyond base64-unwrapping and running it
/// through an `EnvelopeCodec` is out of scope (`spec.md` §1 Non-goals).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub hash: String,
    pub payload: Vec<u8>,
}

/// The seam standing in for the out-of-scope protobuf envelope decoder. An
/// embedding application supplies a real implementation; `IdentityCodec` is
/// a pass-through used in tests and by callers with no decoder wired up yet.
pub trait EnvelopeCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>>;
}

pub struct IdentityCodec;

impl EnvelopeCodec for IdentityCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
