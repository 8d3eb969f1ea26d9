//! Open-group REST client (`spec.md` §4.6): authenticated ADN-style REST
//! over the same HTTP primitive used by the storage-RPC client. A looser
//! concern than the swarm substrate, included because it shares the
//! substrate's HTTP primitive and retry semantics.
pub mod auth;
pub mod client;
pub mod crypto;
pub mod models;

pub use client::OpenGroupClient;
pub use models::{Attachment, AttachmentKind, ChannelInfo, OpenGroupMessage, ProfilePicture, Quote, Signature, UserProfile};
