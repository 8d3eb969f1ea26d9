//! The HTTP primitive (`spec.md` §4.1): two long-lived `reqwest::Client`
//! pools — one validating TLS normally (seed nodes), one accepting any
//! certificate and hostname (service nodes, which use self-signed certs by
//! design) — plus a single `execute` entry point used by both the
//! storage-RPC client and the open-group REST client.
use crate::error::{NetworkError, Result};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Verb {
    /// GET/DELETE place parameters in the query string; PUT/POST/PATCH send
    /// an `application/json` body.
    fn carries_json_body(self) -> bool {
        matches!(self, Verb::Put | Verb::Post | Verb::Patch)
    }
}

/// Builds the seed-node client: standard TLS validation, 20s default
/// timeouts. This is the *only* client flavor with certificate trust
/// enabled — see `snode_client` for the deliberately permissive one.
pub fn build_seed_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(DEFAULT_TIMEOUT)
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("seed reqwest client config is static and always valid")
}

/// Builds the service-node client. Service nodes serve self-signed
/// certificates, so certificate and hostname verification are disabled here
/// — a deliberate trust decision scoped to this client alone.
pub fn build_snode_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(DEFAULT_TIMEOUT)
        .timeout(DEFAULT_TIMEOUT)
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .expect("snode reqwest client config is static and always valid")
}

/// Executes one HTTP call and decodes the body as JSON, per the failure
/// contract of `spec.md` §4.1.
///
/// - Transport error → `HttpRequestFailed { status: 0, body: None }`.
/// - Non-2xx → `HttpRequestFailed { status, body }`.
/// - 2xx with a non-JSON body → `{"result": raw-text}`.
pub async fn execute(
    client: &reqwest::Client,
    verb: Verb,
    url: &str,
    parameters: Option<Value>,
    timeout: Option<Duration>,
    extra_headers: &[(&str, String)],
) -> Result<Value> {
    let mut builder = match verb {
        Verb::Get => client.get(url),
        Verb::Put => client.put(url),
        Verb::Post => client.post(url),
        Verb::Patch => client.patch(url),
        Verb::Delete => client.delete(url),
    };

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    for (key, value) in extra_headers {
        builder = builder.header(*key, value);
    }

    builder = match parameters {
        Some(params) if verb.carries_json_body() => builder.json(&params),
        Some(params) => builder.query(&flatten_to_pairs(&params)),
        None => builder,
    };

    let response = builder.send().await.map_err(|_| NetworkError::HttpRequestFailed {
        status: 0,
        body: None,
    })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(|_| NetworkError::HttpRequestFailed {
        status: status.as_u16(),
        body: None,
    })?;

    if !status.is_success() {
        let body = String::from_utf8(bytes.to_vec()).ok();
        return Err(NetworkError::HttpRequestFailed {
            status: status.as_u16(),
            body,
        });
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => Ok(value),
        Err(_) => {
            let raw = String::from_utf8_lossy(&bytes).into_owned();
            Ok(serde_json::json!({ "result": raw }))
        }
    }
}

/// Query-string parameters must be flat key/value pairs; GET/DELETE calls in
/// this crate only ever pass flat objects.
fn flatten_to_pairs(value: &Value) -> Vec<(String, String)> {
    match value.as_object() {
        Some(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), value_to_query_string(v)))
            .collect(),
        None => Vec::new(),
    }
}

fn value_to_query_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn non_json_2xx_body_is_wrapped_in_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let client = build_seed_client();
        let url = format!("{}/plain", server.uri());
        let value = execute(&client, Verb::Get, &url, None, None, &[]).await.unwrap();
        assert_eq!(value, serde_json::json!({ "result": "hello" }));
    }

    #[tokio::test]
    async fn non_2xx_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = build_seed_client();
        let url = format!("{}/broken", server.uri());
        let err = execute(&client, Verb::Get, &url, None, None, &[]).await.unwrap_err();
        match err {
            NetworkError::HttpRequestFailed { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.as_deref(), Some("nope"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
