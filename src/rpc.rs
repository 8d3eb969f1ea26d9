//! Storage-RPC client (`spec.md` §4.2): invokes a named method on a chosen
//! service node and applies the authoritative status-code policy. This is
//! the single place failure accounting, swarm eviction, and difficulty
//! updates are triggered from a transport result — `send`, `receive`, and
//! `swarm::cache::SwarmDiscovery::get_swarm` all dispatch through `call`.
use crate::difficulty::DifficultyState;
use crate::error::{NetworkError, Result};
use crate::http::{self, Verb};
use crate::node::ServiceNode;
use crate::swarm::{FailureTable, SwarmDiscovery};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{instrument, warn};

pub const METHOD_GET_SWARM: &str = "GetSwarm";
pub const METHOD_GET_MESSAGES: &str = "GetMessages";
pub const METHOD_SEND_MESSAGE: &str = "SendMessage";

/// Borrowed handles to the shared services the status-code policy mutates.
/// Built fresh per call from whichever pieces the caller has to hand —
/// `NetworkContext`'s fields for `send`/`receive`, or `self` for
/// `SwarmDiscovery::get_swarm`, which doesn't carry a `NetworkContext`.
pub struct RpcDeps<'a> {
    pub client: &'a reqwest::Client,
    pub failure: &'a FailureTable,
    pub swarm: &'a SwarmDiscovery,
    pub difficulty: &'a DifficultyState,
}

/// Dispatches `{"method": method, "params": params}` to `target`'s
/// `storage_rpc/v1` endpoint and applies `spec.md` §4.2's status-code table.
#[instrument(skip(deps, params, extra_headers), fields(%method, %target))]
pub async fn call(
    deps: &RpcDeps<'_>,
    public_key: &str,
    target: &ServiceNode,
    method: &str,
    params: Value,
    timeout: Option<Duration>,
    extra_headers: &[(&str, String)],
) -> Result<Value> {
    let body = json!({ "method": method, "params": params });
    let outcome = http::execute(deps.client, Verb::Post, &target.storage_rpc_url(), Some(body), timeout, extra_headers).await;

    match outcome {
        Ok(value) => Ok(value),

        // 421: wrong swarm. Evict from the affected key's swarm cache only —
        // this node may still be perfectly healthy for other keys.
        Err(NetworkError::HttpRequestFailed { status: 421, .. }) => {
            warn!(%target, "snode reported wrong swarm (421), evicting from swarm cache");
            deps.swarm.evict_from_swarm(public_key, target).await;
            Err(NetworkError::SnodeMigrated)
        }

        // 432: insufficient proof of work. Parse and apply the network's
        // reported difficulty before failing.
        Err(NetworkError::HttpRequestFailed { status: 432, body }) => {
            let reported = body
                .as_deref()
                .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
                .and_then(|value| value.get("difficulty").and_then(crate::numeric::as_u64));
            if let Some(difficulty) = reported {
                deps.difficulty.set(difficulty);
            }
            Err(NetworkError::InsufficientProofOfWork {
                required_difficulty: deps.difficulty.current(),
            })
        }

        // 400/500/503, and transport failures (status 0): count against the
        // target, evicting once the failure threshold is crossed.
        Err(NetworkError::HttpRequestFailed { status, body }) if matches!(status, 0 | 400 | 500 | 503) => {
            record_failure_and_maybe_evict(deps, public_key, target).await;
            Err(NetworkError::HttpRequestFailed { status, body })
        }

        Err(NetworkError::HttpRequestFailed { status, body }) => {
            Err(NetworkError::Generic(format!("unexpected storage RPC status {status}: {body:?}")))
        }

        Err(other) => Err(other),
    }
}

/// §4.2 "Eviction": once `FailureTable[target]` reaches the threshold,
/// remove `target` from both the affected key's swarm cache and the
/// `RandomPool`, then reset its counter to 0 (`spec.md` §8 property 1, S3).
async fn record_failure_and_maybe_evict(deps: &RpcDeps<'_>, public_key: &str, target: &ServiceNode) {
    if deps.failure.record_failure(target) {
        warn!(%target, "failure threshold reached, evicting from swarm cache and random pool");
        deps.swarm.evict_from_swarm(public_key, target).await;
        deps.swarm.random_pool.remove(target);
        deps.failure.reset(target);
    }
}
