//! ECDH challenge decryption (`spec.md` §4.6 step 1). The open-group auth
//! challenge is encrypted to the user's curve25519 key with the server's
//! curve25519 public key, IV-prefixed ChaCha20-Poly1305. Grounded in the
//! teacher crate's ed25519-to-x25519 conversion (`rust/actyx/crypto/src/dh.rs`,
//! `ed25519_to_x25519_sk`), which this module adapts the name and derivation
//! of directly; the AEAD primitive itself is new, picked from the same
//! `chacha20poly1305` dependency the teacher's `Cargo.toml` already pulls in.
use crate::error::{NetworkError, Result};
use chacha20poly1305::aead::{Aead, NewAead};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use sha2::{Digest, Sha512};
use x25519_dalek::{PublicKey as XPublicKey, StaticSecret};
use zeroize::Zeroize;

const NONCE_LEN: usize = 12;

/// Derives a curve25519 secret from an ed25519 identity secret: the scalar
/// is the left half of SHA-512 of the ed25519 secret key bytes, the same
/// derivation `ed25519_to_x25519_sk` uses.
pub fn ed25519_to_x25519_secret(ed25519_secret: &ed25519_dalek::SecretKey) -> StaticSecret {
    let mut scalar = [0u8; 32];
    let hash = Sha512::digest(ed25519_secret.as_ref());
    scalar.copy_from_slice(&hash.as_slice()[..32]);
    let secret = StaticSecret::from(scalar);
    scalar.zeroize();
    secret
}

/// Parses a server public key, stripping the leading `05` version byte when
/// the key arrives 33 bytes long (`spec.md` §8 boundary behavior).
pub fn parse_server_public_key(bytes: &[u8]) -> Result<XPublicKey> {
    let raw: &[u8] = match bytes.len() {
        33 => &bytes[1..],
        32 => bytes,
        other => return Err(NetworkError::ParsingFailed(format!("server public key has unexpected length {other}"))),
    };
    let mut array = [0u8; 32];
    array.copy_from_slice(raw);
    Ok(XPublicKey::from(array))
}

/// Decrypts the base64-decoded challenge ciphertext: the shared secret is
/// `ECDH(user_secret, server_public)`, hashed into a ChaCha20-Poly1305 key,
/// and the first 12 bytes of the ciphertext are the nonce.
pub fn decrypt_challenge(user_secret: &StaticSecret, server_public: &XPublicKey, cipher_text: &[u8]) -> Result<Vec<u8>> {
    if cipher_text.len() < NONCE_LEN {
        return Err(NetworkError::ParsingFailed("challenge ciphertext shorter than its nonce prefix".into()));
    }
    let (nonce_bytes, ciphertext) = cipher_text.split_at(NONCE_LEN);

    let shared = user_secret.diffie_hellman(server_public);
    let key_bytes = Sha512::digest(shared.as_bytes());
    let key = Key::from_slice(&key_bytes[..32]);
    let cipher = ChaCha20Poly1305::new(key);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| NetworkError::ParsingFailed("failed to decrypt auth challenge".into()))
}
