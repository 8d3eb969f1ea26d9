//! The embedding application's own long-term identity keypair. Out of scope
//! session/ratchet cryptography never touches this type — it exists only so
//! the open-group client can authenticate (ECDH, `spec.md` §4.6 step 1) and
//! sign outgoing messages (`spec.md` §3 `OpenGroupMessage.signature`).
//!
//! Grounded in the teacher crate's `PrivateKey`/`KeyPair` pair
//! (`rust/actyx/crypto/src/private.rs`, `pair.rs`), simplified to a single
//! value since this crate has no need for the teacher's `libp2p`/`NodeId`
//! interop conversions.
use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signature, Signer};

pub struct Identity {
    pub keypair: Keypair,
}

impl Identity {
    pub fn from_secret_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let secret = SecretKey::from_bytes(bytes)
            .map_err(|e| crate::error::NetworkError::Generic(format!("invalid identity secret key: {e}")))?;
        let public = PublicKey::from(&secret);
        Ok(Self {
            keypair: Keypair { secret, public },
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public
    }

    /// Session public keys are hex-encoded on the wire (`spec.md` §4.6,
    /// `GetSwarm`/`GetMessages` params use `pubKey` as a bare string).
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.keypair.public.to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.keypair.sign(message)
    }
}
