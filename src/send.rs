//! Send path (`spec.md` §4.4): pings prefer a direct P2P delivery to an
//! online peer, falling back to (and every other message always uses) the
//! swarm path — proof-of-work under the "work" executor, concurrent
//! per-target dispatch under the "network" executor, with an opportunistic
//! difficulty update from whichever response lands first.
use crate::context::NetworkContext;
use crate::error::{NetworkError, Result};
use crate::message::Message;
use crate::node::{Peer, ServiceNode};
use crate::numeric;
use crate::pow;
use crate::retry::retry_with;
use crate::rpc::{self, RpcDeps};
use crate::swarm::cache::SwarmDiscovery;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    DeliveredDirect,
    DeliveredViaSwarm { target: ServiceNode },
}

/// Sends `message`. A peer entry for the destination is tried directly when
/// the message is a ping *or* the peer is already marked online (`spec.md`
/// §4.4 step 2); every other case, and any direct attempt that fails, goes
/// through the swarm. `on_p2p_success` is the caller's hook for the direct
/// path — invoked only when delivery succeeds without ever touching the
/// swarm.
pub async fn send_message<F>(ctx: &NetworkContext, message: &Message, on_p2p_success: F) -> Result<SendOutcome>
where
    F: FnOnce(),
{
    if let Some(peer) = ctx.storage.get_peer(&message.destination).await {
        if message.is_ping || peer.is_online {
            match send_direct_to_peer(ctx, &peer, message).await {
                Ok(()) => {
                    ctx.storage.mark_online(&peer.public_key).await;
                    on_p2p_success();
                    return Ok(SendOutcome::DeliveredDirect);
                }
                Err(err) => {
                    warn!(destination = %message.destination, error = %err, "direct delivery failed, falling back to swarm");
                    ctx.storage.mark_offline(&peer.public_key).await;
                }
            }
        }
    }

    send_via_swarm(ctx, message).await
}

/// Wrapped in the bounded retry every RPC in either send path uses
/// (`spec.md` §4.4 "Retries").
async fn send_direct_to_peer(ctx: &NetworkContext, peer: &Peer, message: &Message) -> Result<()> {
    let params = message.to_peer_wire()?;
    let target = peer.target();

    retry_with(ctx.config.max_retry_count, |_attempt| async {
        let _permit = ctx.network_permits.acquire().await.expect("semaphore never closed");
        let deps = RpcDeps {
            client: &ctx.snode_client,
            failure: &ctx.failure,
            swarm: &ctx.swarm,
            difficulty: &ctx.difficulty,
        };
        rpc::call(&deps, &message.destination, &target, rpc::METHOD_SEND_MESSAGE, params.clone(), None, &[]).await
    })
    .await?;
    Ok(())
}

/// Computes proof-of-work for `message` at the network's current difficulty
/// and dispatches it to `config.target_snode_count` swarm members
/// concurrently, succeeding on the first 2xx response. A fatal error (most
/// commonly `InsufficientProofOfWork`, which also updates `DifficultyState`
/// as a side effect) is returned immediately rather than retried, since the
/// nonce computed here is already stale against the new difficulty — the
/// caller re-enters `send_message` to recompute it.
async fn send_via_swarm(ctx: &NetworkContext, message: &Message) -> Result<SendOutcome> {
    let difficulty = ctx.difficulty.current();
    let nonce = compute_nonce(ctx, message, difficulty).await?;

    let swarm = ctx
        .swarm
        .get_swarm(&message.destination, &ctx.seed_client, &ctx.snode_client, &ctx.failure, &ctx.difficulty, &ctx.config)
        .await?;
    let targets = SwarmDiscovery::target_snodes(&swarm, ctx.config.target_snode_count);
    if targets.is_empty() {
        return Err(NetworkError::Generic("no swarm members available to send to".into()));
    }

    dispatch_to_targets(ctx, message, &nonce, &targets).await
}

/// Runs the Hashcash-style nonce search under the "work" semaphore
/// (`spec.md` §5) on a blocking thread — it's a tight CPU loop, not
/// something that should hold an async worker.
async fn compute_nonce(ctx: &NetworkContext, message: &Message, difficulty: u64) -> Result<String> {
    let _permit = ctx.work_permits.acquire().await.expect("semaphore never closed");
    let payload = pow::build_payload(&message.destination, message.ttl_millis, message.timestamp_millis, &message.data);
    let ttl_millis = message.ttl_millis;

    tokio::task::spawn_blocking(move || pow::compute_nonce(&payload, difficulty, ttl_millis))
        .await
        .map_err(|e| NetworkError::ProofOfWorkCalculationFailed(format!("proof-of-work task panicked: {e}")))?
}

/// Fires `SendMessage` at every target concurrently (each gated by the
/// "network" semaphore) and returns the first success. Every response is
/// checked for an advisory `difficulty` field even on success — the network
/// can raise its requirement without ever returning 432 if a send happens to
/// clear the old threshold (`spec.md` §4.4 "opportunistic difficulty
/// update").
async fn dispatch_to_targets(ctx: &NetworkContext, message: &Message, nonce: &str, targets: &[ServiceNode]) -> Result<SendOutcome> {
    let params = message.to_swarm_wire(nonce)?;

    let attempts = targets.iter().map(|target| {
        let params = params.clone();
        let target = target.clone();
        async move {
            let response = retry_with(ctx.config.max_retry_count, |_attempt| async {
                let _permit = ctx.network_permits.acquire().await.expect("semaphore never closed");
                let deps = RpcDeps {
                    client: &ctx.snode_client,
                    failure: &ctx.failure,
                    swarm: &ctx.swarm,
                    difficulty: &ctx.difficulty,
                };
                rpc::call(&deps, &message.destination, &target, rpc::METHOD_SEND_MESSAGE, params.clone(), None, &[]).await
            })
            .await?;

            if let Some(reported) = response.get("difficulty").and_then(numeric::as_u64) {
                ctx.difficulty.set(reported);
            }

            Ok::<SendOutcome, NetworkError>(SendOutcome::DeliveredViaSwarm { target })
        }
    });

    let results = futures::future::join_all(attempts).await;
    let mut last_err = None;
    for result in results {
        match result {
            Ok(outcome) => return Ok(outcome),
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or_else(|| NetworkError::Generic("no swarm targets were attempted".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::node::Peer;
    use crate::storage::in_memory::InMemoryStorage;
    use crate::storage::{PeerStore, SwarmCacheStorage};
    use std::collections::HashSet;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn node_for(server: &MockServer) -> ServiceNode {
        let parsed = url::Url::parse(&server.uri()).unwrap();
        ServiceNode::new(format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap()), parsed.port().unwrap())
    }

    #[tokio::test]
    async fn ping_delivers_directly_to_an_online_peer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage_rpc/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok" })))
            .mount(&server)
            .await;

        let target = node_for(&server);
        let storage = Arc::new(InMemoryStorage::new());
        let ctx = NetworkContext::new(NetworkConfig::default(), storage.clone());

        let peer = Peer {
            public_key: "destkey".into(),
            address: target.address.clone(),
            port: target.port,
            is_online: true,
        };
        storage.set_peer(peer).await;

        let message = Message::ping("destkey");
        let mut callback_invoked = false;
        let outcome = send_message(&ctx, &message, || callback_invoked = true).await.unwrap();
        assert_eq!(outcome, SendOutcome::DeliveredDirect);
        assert!(callback_invoked);
        assert!(storage.get_peer("destkey").await.unwrap().is_online);
    }

    #[tokio::test]
    async fn non_ping_message_to_an_online_peer_also_prefers_direct_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage_rpc/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok" })))
            .mount(&server)
            .await;

        let target = node_for(&server);
        let storage = Arc::new(InMemoryStorage::new());
        let ctx = NetworkContext::new(NetworkConfig::default(), storage.clone());

        let peer = Peer {
            public_key: "destkey".into(),
            address: target.address.clone(),
            port: target.port,
            is_online: true,
        };
        storage.set_peer(peer).await;

        // Not a ping, but the peer is already online — spec.md §4.4 step 2
        // sends directly for either condition, never just "is_ping".
        let message = Message::new("destkey", vec![1, 2, 3], 86_400_000);
        let outcome = send_message(&ctx, &message, || ()).await.unwrap();
        assert_eq!(outcome, SendOutcome::DeliveredDirect);
    }

    #[tokio::test]
    async fn falls_back_to_swarm_when_direct_delivery_fails() {
        let peer_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage_rpc/v1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&peer_server)
            .await;

        let swarm_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage_rpc/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok" })))
            .mount(&swarm_server)
            .await;

        let peer_target = node_for(&peer_server);
        let swarm_target = node_for(&swarm_server);

        let storage = Arc::new(InMemoryStorage::new());
        let mut swarm = HashSet::new();
        swarm.insert(swarm_target.clone());
        swarm.insert(ServiceNode::new("https://1.1.1.1", 1)); // pads past minimum_snode_count
        storage.set_swarm_cache("destkey", swarm).await;

        let peer = Peer {
            public_key: "destkey".into(),
            address: peer_target.address.clone(),
            port: peer_target.port,
            is_online: true,
        };
        storage.set_peer(peer).await;

        let mut config = NetworkConfig::default();
        config.max_retry_count = 1;
        let ctx = NetworkContext::new(config, storage.clone());
        let message = Message::ping("destkey");

        let outcome = send_message(&ctx, &message, || ()).await.unwrap();
        assert!(matches!(outcome, SendOutcome::DeliveredViaSwarm { .. }));
        assert!(!storage.get_peer("destkey").await.unwrap().is_online);
    }

    #[tokio::test]
    async fn non_ping_message_computes_proof_of_work_and_updates_difficulty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage_rpc/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok", "difficulty": 55 })))
            .mount(&server)
            .await;

        let target = node_for(&server);
        let storage = Arc::new(InMemoryStorage::new());
        let mut swarm = HashSet::new();
        swarm.insert(target);
        swarm.insert(ServiceNode::new("https://1.1.1.1", 1));
        storage.set_swarm_cache("destkey", swarm).await;

        let mut config = NetworkConfig::default();
        config.initial_difficulty = 1;
        let ctx = NetworkContext::new(config, storage);

        let message = Message::new("destkey", vec![1, 2, 3], 86_400_000);
        let outcome = send_message(&ctx, &message, || ()).await.unwrap();
        assert!(matches!(outcome, SendOutcome::DeliveredViaSwarm { .. }));
        assert_eq!(ctx.difficulty.current(), 55);
    }
}
