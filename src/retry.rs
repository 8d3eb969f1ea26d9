//! Bounded retry wrapper (`spec.md` §4.4 "Retries", §7 propagation policy).
//! Grounded in the teacher crate's `HttpClient::do_request` backoff loop
//! (`rust/sdk/src/client.rs`): exponential delay plus random jitter, capped
//! at a fixed attempt count. Generalized here to wrap any fallible async
//! operation rather than just the 503 branch the teacher retries.
use crate::error::{NetworkError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Calls `attempt` up to `max_attempts` times. Stops immediately, without
/// retrying, on an error `NetworkError::is_fatal_to_call()` reports true for
/// — those errors already mutated shared state (swarm eviction, difficulty
/// update, token clear) and must be surfaced so the caller can re-enter.
pub async fn retry_with<T, F, Fut>(max_attempts: usize, mut attempt: F) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = Duration::from_millis(0);
    let mut tries = 0usize;

    loop {
        tries += 1;
        match attempt(tries).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_fatal_to_call() || tries >= max_attempts => return Err(err),
            Err(err) => {
                delay = delay * 2 + Duration::from_millis(rand::thread_rng().gen_range(10..200));
                debug!(attempt = tries, ?delay, error = %err, "retrying after failure");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn stops_retrying_on_fatal_error() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with(8, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(NetworkError::TokenExpired) }
        })
        .await;

        assert!(matches!(result, Err(NetworkError::TokenExpired)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with(3, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(NetworkError::Generic("nope".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let result = retry_with(8, |_attempt| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(NetworkError::Generic("transient".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
