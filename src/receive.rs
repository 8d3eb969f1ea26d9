//! Receive path (`spec.md` §4.5): polls (or long-polls) `GetMessages`
//! against a single swarm member, advances `LastMessageHash` from the last
//! element of the response regardless of how many are new, dedupes against
//! the process's `ReceivedHashSet`, and decodes each surviving entry through
//! the caller's `EnvelopeCodec`.
use crate::context::NetworkContext;
use crate::error::{NetworkError, Result};
use crate::http::LONG_POLL_TIMEOUT;
use crate::message::{Envelope, EnvelopeCodec};
use crate::retry::retry_with;
use crate::rpc::{self, RpcDeps};
use crate::swarm::cache::SwarmDiscovery;
use serde_json::json;
use tracing::warn;

const GET_MESSAGES_COUNT: u32 = 100;

/// Polls for new messages addressed to `public_key`, decoding each through
/// `codec`. `long_poll` selects the long-poll timeout over the default one;
/// both use the same `GetMessages` method and status-code policy every other
/// storage RPC call uses.
pub async fn get_messages(ctx: &NetworkContext, public_key: &str, codec: &dyn EnvelopeCodec, long_poll: bool) -> Result<Vec<Envelope>> {
    let swarm = ctx
        .swarm
        .get_swarm(public_key, &ctx.seed_client, &ctx.snode_client, &ctx.failure, &ctx.difficulty, &ctx.config)
        .await?;
    let target =
        SwarmDiscovery::single_target(&swarm).ok_or_else(|| NetworkError::Generic("no swarm members available to poll".into()))?;

    let last_hash = ctx.storage.get_last_message_hash_value(&target).await.unwrap_or_default();
    let params = json!({ "pubKey": public_key, "lastHash": last_hash, "maxCount": GET_MESSAGES_COUNT });
    let timeout = long_poll.then_some(LONG_POLL_TIMEOUT);
    let headers: Vec<(&str, String)> = if long_poll { vec![("X-Loki-Long-Poll", "true".to_string())] } else { Vec::new() };

    let response = retry_with(ctx.config.max_retry_count, |_attempt| async {
        let _permit = ctx.network_permits.acquire().await.expect("semaphore never closed");
        let deps = RpcDeps {
            client: &ctx.snode_client,
            failure: &ctx.failure,
            swarm: &ctx.swarm,
            difficulty: &ctx.difficulty,
        };
        rpc::call(&deps, public_key, &target, rpc::METHOD_GET_MESSAGES, params.clone(), timeout, &headers).await
    })
    .await?;

    let raw_messages = response.get("messages").and_then(|m| m.as_array()).cloned().unwrap_or_default();

    // Advance the cursor to the last element regardless of whether every
    // entry turns out to be a duplicate — the swarm's ordering, not ours.
    if let Some(last_hash) = raw_messages.last().and_then(|m| m.get("hash")).and_then(|h| h.as_str()) {
        ctx.storage.set_last_message_hash_value(&target, last_hash.to_string()).await;
    }

    let mut seen = ctx.storage.get_received_message_hash_values().await;
    let mut envelopes = Vec::with_capacity(raw_messages.len());

    for raw in raw_messages {
        let hash = match raw.get("hash").and_then(|h| h.as_str()) {
            Some(hash) => hash.to_string(),
            None => {
                warn!("skipping a GetMessages entry with no hash field");
                continue;
            }
        };
        if seen.contains(&hash) {
            continue;
        }

        let data = match raw.get("data").and_then(|d| d.as_str()) {
            Some(encoded) => match base64::decode(encoded) {
                Ok(bytes) => bytes,
                Err(_) => {
                    warn!(%hash, "skipping message with invalid base64 data");
                    continue;
                }
            },
            None => {
                warn!(%hash, "skipping message with no data field");
                continue;
            }
        };

        match decode(ctx, codec, &data).await {
            Ok(payload) => {
                seen.insert(hash.clone());
                envelopes.push(Envelope { hash, payload });
            }
            Err(err) => warn!(%hash, error = %err, "skipping message that failed to decode"),
        }
    }

    ctx.storage.set_received_message_hash_values(seen).await;
    Ok(envelopes)
}

/// Runs the codec under the "work" semaphore (`spec.md` §5) — envelope
/// decoding sits in the same CPU-bound category as signature verification
/// and proof-of-work.
async fn decode(ctx: &NetworkContext, codec: &dyn EnvelopeCodec, bytes: &[u8]) -> Result<Vec<u8>> {
    let _permit = ctx.work_permits.acquire().await.expect("semaphore never closed");
    codec.decode(bytes)
}
