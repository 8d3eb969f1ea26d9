//! Client-side networking core for a decentralized, swarm-replicated
//! messaging service: service-node discovery and the storage-RPC substrate
//! built on top of it, a proof-of-work-gated send path, a deduplicating
//! receive path, and an authenticated open-group REST client. Persistence,
//! envelope cryptography, and UI concerns are out of scope — embedding
//! applications supply those through `storage::*` traits, `Identity`, and
//! `message::EnvelopeCodec`.
pub mod config;
pub mod context;
pub mod difficulty;
pub mod error;
pub mod http;
pub mod identity;
pub mod message;
pub mod node;
pub mod numeric;
pub mod opengroup;
pub mod pow;
pub mod receive;
pub mod retry;
pub mod rpc;
pub mod send;
pub mod storage;
pub mod swarm;

pub use config::NetworkConfig;
pub use context::NetworkContext;
pub use difficulty::DifficultyState;
pub use error::{NetworkError, Result};
pub use identity::Identity;
pub use message::{Envelope, EnvelopeCodec, IdentityCodec, Message};
pub use node::{Peer, ServiceNode};
pub use opengroup::OpenGroupClient;
pub use receive::get_messages;
pub use send::{send_message, SendOutcome};
pub use swarm::{FailureTable, RandomPool, SwarmDiscovery};
