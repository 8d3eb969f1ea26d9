//! Domain records for the open-group (ADN-style) REST API (`spec.md` §3
//! "OpenGroupMessage", "Attachment").
use ed25519_dalek::{PublicKey, Signature as Ed25519Signature, Verifier};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    Photo,
    Video,
    Audio,
    Generic,
    LinkPreview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub server: String,
    pub id: i64,
    pub content_type: String,
    pub size: u64,
    pub filename: Option<String>,
    pub flags: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub caption: Option<String>,
    pub url: String,
    pub link_preview_url: Option<String>,
    pub link_preview_title: Option<String>,
}

impl Attachment {
    /// `LinkPreview` requires both `link_preview_url` and
    /// `link_preview_title` (`spec.md` §3 "Attachment").
    pub fn is_valid(&self) -> bool {
        if self.kind == AttachmentKind::LinkPreview {
            self.link_preview_url.is_some() && self.link_preview_title.is_some()
        } else {
            true
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub quoted_timestamp: i64,
    pub author: String,
    pub text: Option<String>,
    pub reply_to: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePicture {
    pub profile_key: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub bytes: Vec<u8>,
    pub version: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenGroupMessage {
    pub server_id: i64,
    pub author: String,
    pub display_name: String,
    pub body: String,
    /// Author-stamped timestamp (milliseconds), taken from the message
    /// annotation when present and falling back to `server_timestamp`.
    pub timestamp: i64,
    pub quote: Option<Quote>,
    pub attachments: Vec<Attachment>,
    pub profile_picture: Option<ProfilePicture>,
    pub signature: Option<Signature>,
    /// Server-stamped timestamp (milliseconds), parsed from `created_at`.
    pub server_timestamp: i64,
}

impl OpenGroupMessage {
    /// The byte sequence the client-side signature is computed and verified
    /// over: the author-stamped timestamp, the body, and each attachment id
    /// in order. Deterministic and stable across signing and verification —
    /// both `OpenGroupClient::post_message` and `has_valid_signature` build
    /// it the same way.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.timestamp.to_string().as_bytes());
        buf.extend_from_slice(self.body.as_bytes());
        for attachment in &self.attachments {
            buf.extend_from_slice(attachment.id.to_string().as_bytes());
        }
        buf
    }

    /// §3 invariant: "on receive, `hasValidSignature()` must hold or the
    /// message is discarded."
    pub fn has_valid_signature(&self) -> bool {
        let signature = match &self.signature {
            Some(sig) => sig,
            None => return false,
        };
        let public_key = match decode_author_public_key(&self.author) {
            Some(key) => key,
            None => return false,
        };
        let sig = match Ed25519Signature::from_bytes(&signature.bytes) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        public_key.verify(&self.signing_payload(), &sig).is_ok()
    }
}

/// Session-style public keys are hex-encoded, `05`-prefixed 33-byte
/// identifiers; the signing key is the trailing 32 raw ed25519 bytes, the
/// same strip-the-version-byte convention as the auth challenge's server
/// public key (`spec.md` §4.6 step 1, §8 boundary behavior).
fn decode_author_public_key(author: &str) -> Option<PublicKey> {
    let bytes = hex::decode(author).ok()?;
    let raw: &[u8] = if bytes.len() == 33 { &bytes[1..] } else { &bytes[..] };
    PublicKey::from_bytes(raw).ok()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub user_count: u64,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub public_key: String,
    pub display_name: Option<String>,
    pub annotations: Vec<serde_json::Value>,
}
