//! Proof-of-work computation (`spec.md` §4.4, GLOSSARY "Proof of work"): a
//! Hashcash-style nonce search over `(recipient, ttl, timestamp, data)` at a
//! difficulty chosen by the network. This runs on the "work" executor
//! (`spec.md` §5), never the networking one.
use crate::error::{NetworkError, Result};
use sha2::{Digest, Sha512};

/// Upper bound on search iterations before giving up and failing with
/// `ProofOfWorkCalculationFailed`; at any difficulty the network realistically
/// asks for this is many orders of magnitude more than the expected number
/// of tries, so hitting it indicates a pathological difficulty value rather
/// than bad luck.
const MAX_ITERATIONS: u64 = 1_000_000_000;

/// Assembles the payload the nonce is hashed against: destination public key,
/// TTL (milliseconds), timestamp (milliseconds), and the message data.
pub fn build_payload(destination: &str, ttl_millis: u64, timestamp_millis: u64, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(destination.len() + 16 + data.len());
    payload.extend_from_slice(timestamp_millis.to_string().as_bytes());
    payload.extend_from_slice(ttl_millis.to_string().as_bytes());
    payload.extend_from_slice(destination.as_bytes());
    payload.extend_from_slice(data);
    payload
}

/// The acceptance threshold: the leading 8 bytes of the double-SHA512 digest,
/// read as a big-endian integer, must be below this value. Higher difficulty
/// means a smaller threshold and thus a rarer nonce.
fn threshold(difficulty: u64, payload_len: usize, ttl_millis: u64) -> u64 {
    let ttl_seconds = (ttl_millis / 1000).max(1);
    let size_factor = (payload_len as u64 + ttl_seconds).max(1);
    let denominator = difficulty.max(1) * size_factor;
    u64::MAX / denominator.max(1)
}

/// Searches for a nonce satisfying the difficulty target and returns it
/// base64-encoded, ready to be placed in the `SendMessage` RPC params.
pub fn compute_nonce(payload: &[u8], difficulty: u64, ttl_millis: u64) -> Result<String> {
    let target = threshold(difficulty, payload.len(), ttl_millis);

    for nonce in 0..MAX_ITERATIONS {
        let nonce_bytes = nonce.to_be_bytes();
        let mut hasher = Sha512::new();
        hasher.update(&nonce_bytes);
        hasher.update(payload);
        let digest = hasher.finalize();

        let mut hasher2 = Sha512::new();
        hasher2.update(&digest);
        let digest2 = hasher2.finalize();

        let mut leading = [0u8; 8];
        leading.copy_from_slice(&digest2[..8]);
        let value = u64::from_be_bytes(leading);

        if value < target {
            return Ok(base64::encode(nonce_bytes));
        }
    }

    Err(NetworkError::ProofOfWorkCalculationFailed(format!(
        "no nonce found within {MAX_ITERATIONS} iterations at difficulty {difficulty}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_a_nonce_at_low_difficulty() {
        let payload = build_payload("05deadbeef", 86_400_000, 1_700_000_000_000, b"hello");
        let nonce = compute_nonce(&payload, 1, 86_400_000).unwrap();
        assert!(!nonce.is_empty());
    }

    #[test]
    fn same_inputs_reproduce_the_same_nonce() {
        let payload = build_payload("05deadbeef", 86_400_000, 1_700_000_000_000, b"hello");
        let a = compute_nonce(&payload, 1, 86_400_000).unwrap();
        let b = compute_nonce(&payload, 1, 86_400_000).unwrap();
        assert_eq!(a, b);
    }
}
