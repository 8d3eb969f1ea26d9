//! Open-group REST client (`spec.md` §4.6): ADN-style `/channels`, `/users`,
//! `/files`, and `/loki/v1/*` endpoints over the shared HTTP primitive,
//! authenticated via `AuthCoordinator`. Grounded in the teacher crate's
//! `HttpClient` (`rust/sdk/src/http_client.rs`): one struct wrapping a
//! `reqwest::Client` plus small per-endpoint methods that build a URL,
//! dispatch, and decode — generalized here to cover many more endpoints and
//! wrapped in the bounded retry every storage-RPC call also uses.
use crate::context::NetworkContext;
use crate::error::{NetworkError, Result};
use crate::http::{self, Verb};
use crate::identity::Identity;
use crate::numeric;
use crate::opengroup::auth::AuthCoordinator;
use crate::opengroup::models::{Attachment, AttachmentKind, ChannelInfo, OpenGroupMessage, ProfilePicture, Quote, Signature, UserProfile};
use crate::retry::retry_with;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// One authenticated client bound to a single identity. `server` is passed
/// per-call since a single identity may talk to many open-group servers,
/// each with its own cached token (`AuthTokenStorage` is keyed by server).
pub struct OpenGroupClient {
    ctx: NetworkContext,
    auth: Arc<AuthCoordinator>,
    identity: Arc<Identity>,
}

impl OpenGroupClient {
    pub fn new(ctx: NetworkContext, identity: Arc<Identity>) -> Self {
        let auth = ctx.auth.clone();
        Self { ctx, auth, identity }
    }

    /// `GET channels/{c}/messages` (`spec.md` §4.6). Uses `since_id` when a
    /// cursor is already persisted for `(channel, server)`, otherwise the
    /// initial `count=64&include_deleted=0` form. Updates `LastServerId` to
    /// the max id seen, discards messages with an invalid signature, and
    /// returns the rest sorted ascending by `server_timestamp`.
    pub async fn get_messages(&self, server: &str, channel: i64) -> Result<Vec<OpenGroupMessage>> {
        let since = self.ctx.storage.get_last_message_server_id(channel, server).await;
        let url = match since {
            Some(since_id) => format!("{server}/channels/{channel}/messages?include_annotations=1&since_id={since_id}"),
            None => format!("{server}/channels/{channel}/messages?include_annotations=1&count=64&include_deleted=0"),
        };

        let response = self.authenticated_request(server, Verb::Get, &url, None).await?;
        let raw_messages = response.as_array().cloned().unwrap_or_default();

        let mut max_id = since.unwrap_or(0);
        let mut messages = Vec::new();
        for raw in raw_messages {
            match parse_message(&raw) {
                Some(message) => {
                    max_id = max_id.max(message.server_id);
                    messages.push(message);
                }
                None => warn!("skipping open-group message that failed to parse or verify"),
            }
        }

        if max_id > since.unwrap_or(0) {
            self.ctx.storage.set_last_message_server_id(channel, server, max_id).await;
        }

        messages.sort_by_key(|m| m.server_timestamp);
        Ok(messages)
    }

    /// `GET loki/v1/channel/{c}/deletes` — deletion ids, cursor tracked
    /// separately from message polling (`spec.md` §4.6, §3 "LastDeletionId").
    pub async fn get_deletions(&self, server: &str, channel: i64) -> Result<Vec<i64>> {
        let since = self.ctx.storage.get_last_deletion_server_id(channel, server).await;
        let url = match since {
            Some(since_id) => format!("{server}/loki/v1/channel/{channel}/deletes?since_id={since_id}"),
            None => format!("{server}/loki/v1/channel/{channel}/deletes?count=64"),
        };

        let response = self.authenticated_request(server, Verb::Get, &url, None).await?;
        let ids: Vec<i64> = response
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|entry| numeric::as_i64(entry.get("id")?))
            .collect();

        if let Some(max_id) = ids.iter().copied().max() {
            if max_id > since.unwrap_or(0) {
                self.ctx.storage.set_last_deletion_server_id(channel, server, max_id).await;
            }
        }

        Ok(ids)
    }

    /// `POST channels/{c}/messages` — signs the body client-side before
    /// sending, then parses the echoed message from the response.
    pub async fn post_message(
        &self,
        server: &str,
        channel: i64,
        body: String,
        quote: Option<Quote>,
        attachments: Vec<Attachment>,
    ) -> Result<OpenGroupMessage> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_millis() as i64;

        let draft = OpenGroupMessage {
            server_id: 0,
            author: self.identity.public_key_hex(),
            display_name: self.identity.public_key_hex(),
            body,
            timestamp: now,
            quote,
            attachments,
            profile_picture: None,
            signature: None,
            server_timestamp: now,
        };

        let signature = self.identity.sign(&draft.signing_payload());
        let params = json!({
            "annotations": [{
                "type": "network.loki.messenger.publicChat",
                "value": {
                    "timestamp": draft.timestamp,
                    "quote": draft.quote.as_ref().map(quote_to_json),
                    "sig": base64::encode(signature.to_bytes()),
                    "sigver": 1,
                }
            }],
            "text": draft.body,
        });

        let url = format!("{server}/channels/{channel}/messages");
        let response = self.authenticated_request(server, Verb::Post, &url, Some(params)).await?;
        parse_message(&response).ok_or_else(|| NetworkError::ParsingFailed("server echoed an unparseable message".into()))
    }

    /// `DELETE channels/{c}/messages/{id}` (self) or
    /// `DELETE loki/v1/moderation/message/{id}` (moderator).
    pub async fn delete_message(&self, server: &str, channel: i64, id: i64, as_moderator: bool) -> Result<()> {
        let url = if as_moderator {
            format!("{server}/loki/v1/moderation/message/{id}")
        } else {
            format!("{server}/channels/{channel}/messages/{id}")
        };
        self.authenticated_request(server, Verb::Delete, &url, None).await?;
        Ok(())
    }

    /// Bulk delete: `DELETE loki/v1/messages?ids=…` (self) or
    /// `DELETE loki/v1/moderation/messages?ids=…` (moderator). Idempotent at
    /// this layer — a 404 on retry is treated the same as success by the
    /// underlying HTTP primitive only if the server returns 2xx; a
    /// persistent failure still surfaces after retries are exhausted
    /// (`spec.md` §8 "Round-trip/idempotence").
    pub async fn delete_messages(&self, server: &str, ids: &[i64], as_moderator: bool) -> Result<()> {
        let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        let url = if as_moderator {
            format!("{server}/loki/v1/moderation/messages?ids={joined}")
        } else {
            format!("{server}/loki/v1/messages?ids={joined}")
        };
        self.authenticated_request(server, Verb::Delete, &url, None).await?;
        Ok(())
    }

    /// `GET loki/v1/channel/{c}/get_moderators`, cached per `(server,
    /// channel)` in `NetworkContext::moderators`.
    pub async fn get_moderators(&self, server: &str, channel: i64) -> Result<Vec<String>> {
        let key = (server.to_string(), channel);
        if let Some(cached) = self.ctx.moderators.lock().get(&key).cloned() {
            return Ok(cached);
        }

        let url = format!("{server}/loki/v1/channel/{channel}/get_moderators");
        let response = self.authenticated_request(server, Verb::Get, &url, None).await?;
        let moderators: Vec<String> = response
            .get("moderators")
            .and_then(|m| m.as_array())
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        self.ctx.moderators.lock().insert(key, moderators.clone());
        Ok(moderators)
    }

    /// `GET /channels/{c}?include_annotations=1` — channel info; updates the
    /// persisted user count and avatar URL.
    pub async fn get_channel_info(&self, server: &str, channel: i64) -> Result<ChannelInfo> {
        let url = format!("{server}/channels/{channel}?include_annotations=1");
        let response = self.authenticated_request(server, Verb::Get, &url, None).await?;

        let user_count = response.get("counts").and_then(|c| c.get("subscribers")).and_then(numeric::as_u64).unwrap_or(0);
        let avatar_url = response
            .get("annotations")
            .and_then(|a| a.as_array())
            .and_then(|a| find_annotation(a, "net.patter-app.settings"))
            .and_then(|a| a.get("value"))
            .and_then(|v| v.get("avatar"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        self.ctx.storage.set_user_count(channel, server, user_count).await;
        self.ctx.storage.set_open_group_avatar_url(channel, server, avatar_url.clone()).await;

        Ok(ChannelInfo { user_count, avatar_url })
    }

    /// `POST /channels/{c}/subscribe`.
    pub async fn subscribe(&self, server: &str, channel: i64) -> Result<()> {
        let url = format!("{server}/channels/{channel}/subscribe");
        self.authenticated_request(server, Verb::Post, &url, Some(json!({}))).await?;
        Ok(())
    }

    /// `DELETE /channels/{c}/subscribe`.
    pub async fn unsubscribe(&self, server: &str, channel: i64) -> Result<()> {
        let url = format!("{server}/channels/{channel}/subscribe");
        self.authenticated_request(server, Verb::Delete, &url, None).await?;
        Ok(())
    }

    /// `GET users?ids=@k1,@k2…&include_user_annotations=0|1` — batch profile
    /// fetch.
    pub async fn get_users(&self, server: &str, public_keys: &[String], include_annotations: bool) -> Result<Vec<UserProfile>> {
        let ids = public_keys.iter().map(|k| format!("@{k}")).collect::<Vec<_>>().join(",");
        let flag = if include_annotations { 1 } else { 0 };
        let url = format!("{server}/users?ids={ids}&include_user_annotations={flag}");

        let response = self.authenticated_request(server, Verb::Get, &url, None).await?;
        let profiles = response
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|entry| {
                Some(UserProfile {
                    public_key: entry.get("username")?.as_str()?.to_string(),
                    display_name: entry.get("name").and_then(|v| v.as_str()).map(str::to_string),
                    annotations: entry.get("annotations").and_then(|a| a.as_array()).cloned().unwrap_or_default(),
                })
            })
            .collect();
        Ok(profiles)
    }

    /// `PATCH users/me` with `{name}` — sets the display name.
    pub async fn set_display_name(&self, server: &str, name: &str) -> Result<()> {
        let url = format!("{server}/users/me");
        self.authenticated_request(server, Verb::Patch, &url, Some(json!({ "name": name }))).await?;
        Ok(())
    }

    /// `PATCH users/me` with `{annotations:[{type, value?}]}`. A `None`
    /// value removes the annotation (`spec.md` §4.6).
    pub async fn set_self_annotation(&self, server: &str, annotation_type: &str, value: Option<Value>) -> Result<()> {
        let url = format!("{server}/users/me");
        let body = json!({ "annotations": [{ "type": annotation_type, "value": value }] });
        self.authenticated_request(server, Verb::Patch, &url, Some(body)).await?;
        Ok(())
    }

    /// Multipart upload to `{server}/files`. Uploads are an opaque streaming
    /// primitive in this spec (`spec.md` §1 Non-goals) — `bytes` is taken
    /// whole rather than as a stream.
    pub async fn upload_file(&self, server: &str, filename: &str, content_type: &str, bytes: Vec<u8>) -> Result<(i64, String)> {
        self.upload(server, "files", filename, content_type, bytes).await
    }

    /// Multipart upload to `{server}/users/me/avatar`; response shape nests
    /// under `data.avatar_image.url` instead of `data.url`.
    pub async fn upload_avatar(&self, server: &str, filename: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let (_id, url) = self.upload(server, "users/me/avatar", filename, content_type, bytes).await?;
        Ok(url)
    }

    async fn upload(&self, server: &str, path: &str, filename: &str, content_type: &str, bytes: Vec<u8>) -> Result<(i64, String)> {
        let token = self.auth.token_for(&self.ctx, server, &self.identity).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| NetworkError::Generic(format!("invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{server}/{path}");
        let response = self
            .ctx
            .seed_client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .map_err(|_| NetworkError::HttpRequestFailed { status: 0, body: None })?;

        let status = response.status();
        if status.as_u16() == 401 {
            self.auth.clear(&self.ctx, server).await;
            return Err(NetworkError::TokenExpired);
        }
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(NetworkError::HttpRequestFailed { status: status.as_u16(), body });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|_| NetworkError::ParsingFailed("upload response was not valid JSON".into()))?;

        let data = value.get("data").ok_or_else(|| NetworkError::ParsingFailed("upload response missing data".into()))?;
        let id = data.get("id").and_then(numeric::as_i64).unwrap_or(0);
        let url = data
            .get("url")
            .or_else(|| data.get("avatar_image").and_then(|a| a.get("url")))
            .and_then(|v| v.as_str())
            .ok_or_else(|| NetworkError::ParsingFailed("upload response missing url".into()))?
            .to_string();

        Ok((id, url))
    }

    /// Wraps one authenticated REST call in the bounded retry every
    /// storage-RPC call also uses; a 401 clears the token and fails with
    /// `TokenExpired`, which `retry_with` treats as fatal-to-call so the
    /// caller re-enters with a fresh challenge exchange (`spec.md` S6).
    async fn authenticated_request(&self, server: &str, verb: Verb, url: &str, params: Option<Value>) -> Result<Value> {
        retry_with(self.ctx.config.max_retry_count, |_attempt| {
            let params = params.clone();
            async move {
                let token = self.auth.token_for(&self.ctx, server, &self.identity).await?;
                let headers = [("Authorization", format!("Bearer {token}"))];
                match http::execute(&self.ctx.seed_client, verb, url, params, None, &headers).await {
                    Ok(value) => Ok(value),
                    Err(NetworkError::HttpRequestFailed { status: 401, .. }) => {
                        self.auth.clear(&self.ctx, server).await;
                        Err(NetworkError::TokenExpired)
                    }
                    Err(other) => Err(other),
                }
            }
        })
        .await
    }
}

fn quote_to_json(quote: &Quote) -> Value {
    json!({
        "id": quote.quoted_timestamp,
        "author": quote.author,
        "text": quote.text,
        "replyTo": quote.reply_to,
    })
}

fn find_annotation<'a>(annotations: &'a [Value], type_name: &str) -> Option<&'a Value> {
    annotations.iter().find(|a| a.get("type").and_then(|t| t.as_str()) == Some(type_name))
}

/// Parses one raw ADN message entry into an `OpenGroupMessage`, applying
/// `spec.md` §4.6's field rules: skip `is_deleted`, pull the quote/signature
/// out of the `network.loki.messenger.publicChat` annotation, attachments
/// out of `net.app.core.oembed` annotations, numeric fields parsed
/// defensively, `created_at` parsed as ISO-8601 UTC. Returns `None` (logged
/// by the caller) on any structural failure or a failing signature.
fn parse_message(raw: &Value) -> Option<OpenGroupMessage> {
    if raw.get("is_deleted").and_then(|v| v.as_bool()).unwrap_or(false) {
        return None;
    }

    let server_id = numeric::as_i64(raw.get("id")?)?;
    let user = raw.get("user")?;
    let author = user.get("username")?.as_str()?.to_string();
    let display_name = user.get("name").and_then(|v| v.as_str()).unwrap_or(&author).to_string();
    let body = raw.get("text").and_then(|v| v.as_str()).unwrap_or_default().to_string();

    let created_at = raw.get("created_at")?.as_str()?;
    let server_timestamp = chrono::DateTime::parse_from_rfc3339(created_at)
        .ok()?
        .with_timezone(&chrono::Utc)
        .timestamp_millis();

    let annotations = raw.get("annotations").and_then(|a| a.as_array()).cloned().unwrap_or_default();
    let chat_value = find_annotation(&annotations, "network.loki.messenger.publicChat").and_then(|a| a.get("value"));

    let timestamp = chat_value.and_then(|v| v.get("timestamp")).and_then(numeric::as_i64).unwrap_or(server_timestamp);
    let quote = chat_value.and_then(|v| v.get("quote")).and_then(parse_quote);
    let signature = chat_value.and_then(|v| {
        let bytes = base64::decode(v.get("sig")?.as_str()?).ok()?;
        let version = v.get("sigver").and_then(numeric::as_u64).unwrap_or(1) as u8;
        Some(Signature { bytes, version })
    });

    let attachments = annotations
        .iter()
        .filter(|a| a.get("type").and_then(|t| t.as_str()) == Some("net.app.core.oembed"))
        .filter_map(parse_attachment)
        .collect();

    let profile_picture = user.get("avatar").and_then(parse_profile_picture);

    let message = OpenGroupMessage {
        server_id,
        author,
        display_name,
        body,
        timestamp,
        quote,
        attachments,
        profile_picture,
        signature,
        server_timestamp,
    };

    if !message.has_valid_signature() {
        return None;
    }
    Some(message)
}

fn parse_quote(value: &Value) -> Option<Quote> {
    Some(Quote {
        quoted_timestamp: numeric::as_i64(value.get("id")?)?,
        author: value.get("author")?.as_str()?.to_string(),
        text: value.get("text").and_then(|v| v.as_str()).map(str::to_string),
        reply_to: value.get("replyTo").and_then(numeric::as_i64),
    })
}

fn parse_attachment(raw: &Value) -> Option<Attachment> {
    let info = raw.get("value")?;
    let kind = match info.get("type").and_then(|v| v.as_str()).unwrap_or("generic") {
        "photo" | "image" => AttachmentKind::Photo,
        "video" => AttachmentKind::Video,
        "audio" => AttachmentKind::Audio,
        "link_preview" | "preview" => AttachmentKind::LinkPreview,
        _ => AttachmentKind::Generic,
    };

    let attachment = Attachment {
        kind,
        server: info.get("server").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        id: info.get("id").and_then(numeric::as_i64).unwrap_or_default(),
        content_type: info.get("contentType").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        size: info.get("size").and_then(numeric::as_u64).unwrap_or_default(),
        filename: info.get("fileName").and_then(|v| v.as_str()).map(str::to_string),
        flags: info.get("flags").and_then(numeric::as_u64).unwrap_or_default() as u32,
        width: info.get("width").and_then(numeric::as_u64).map(|v| v as u32),
        height: info.get("height").and_then(numeric::as_u64).map(|v| v as u32),
        caption: info.get("caption").and_then(|v| v.as_str()).map(str::to_string),
        url: info.get("url").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        link_preview_url: info.get("linkPreviewUrl").and_then(|v| v.as_str()).map(str::to_string),
        link_preview_title: info.get("linkPreviewTitle").and_then(|v| v.as_str()).map(str::to_string),
    };

    attachment.is_valid().then_some(attachment)
}

fn parse_profile_picture(value: &Value) -> Option<ProfilePicture> {
    Some(ProfilePicture {
        profile_key: value.get("profileKey")?.as_str()?.to_string(),
        url: value.get("url")?.as_str()?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::storage::in_memory::InMemoryStorage;
    use ed25519_dalek::Keypair;
    use rand::rngs::OsRng;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_annotation(keypair: &Keypair, timestamp: i64, body: &str) -> Value {
        use ed25519_dalek::Signer;
        let draft = OpenGroupMessage {
            server_id: 0,
            author: hex::encode(keypair.public.to_bytes()),
            display_name: "alice".into(),
            body: body.into(),
            timestamp,
            quote: None,
            attachments: Vec::new(),
            profile_picture: None,
            signature: None,
            server_timestamp: timestamp,
        };
        let sig = keypair.sign(&draft.signing_payload());
        json!({
            "type": "network.loki.messenger.publicChat",
            "value": { "timestamp": timestamp, "sig": base64::encode(sig.to_bytes()), "sigver": 1 }
        })
    }

    #[tokio::test]
    async fn get_messages_discards_invalid_signatures_and_sorts_ascending() {
        let server = MockServer::start().await;
        let keypair = Keypair::generate(&mut OsRng);
        let author = hex::encode(keypair.public.to_bytes());

        let valid_later = json!({
            "id": 2,
            "text": "second",
            "created_at": "2024-01-01T00:00:02Z",
            "user": { "username": author, "name": "alice" },
            "annotations": [signed_annotation(&keypair, 2000, "second")],
        });
        let valid_earlier = json!({
            "id": 1,
            "text": "first",
            "created_at": "2024-01-01T00:00:01Z",
            "user": { "username": author, "name": "alice" },
            "annotations": [signed_annotation(&keypair, 1000, "first")],
        });
        let tampered = json!({
            "id": 3,
            "text": "not what was signed",
            "created_at": "2024-01-01T00:00:03Z",
            "user": { "username": author, "name": "alice" },
            "annotations": [signed_annotation(&keypair, 3000, "original")],
        });
        let deleted = json!({
            "id": 4,
            "is_deleted": true,
            "text": "gone",
            "created_at": "2024-01-01T00:00:04Z",
            "user": { "username": author, "name": "alice" },
        });

        Mock::given(method("GET"))
            .and(path("/channels/1/messages"))
            .and(query_param("count", "64"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([valid_later, valid_earlier, tampered, deleted])))
            .mount(&server)
            .await;

        let identity = Arc::new(Identity::from_secret_bytes(&Keypair::generate(&mut OsRng).secret.to_bytes()).unwrap());
        let storage = Arc::new(InMemoryStorage::new());
        let ctx = NetworkContext::new(NetworkConfig::default(), storage.clone());
        storage.set_auth_token(&server.uri(), Some("token".into())).await;
        let client = OpenGroupClient::new(ctx, identity);

        let messages = client.get_messages(&server.uri(), 1).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body, "first");
        assert_eq!(messages[1].body, "second");

        let cursor = storage.get_last_message_server_id(1, &server.uri()).await;
        assert_eq!(cursor, Some(4));
    }

    #[tokio::test]
    async fn second_call_uses_since_id_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1/messages"))
            .and(query_param("since_id", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let identity = Arc::new(Identity::from_secret_bytes(&Keypair::generate(&mut OsRng).secret.to_bytes()).unwrap());
        let storage = Arc::new(InMemoryStorage::new());
        storage.set_auth_token(&server.uri(), Some("token".into())).await;
        storage.set_last_message_server_id(1, &server.uri(), 1000).await;
        let ctx = NetworkContext::new(NetworkConfig::default(), storage);
        let client = OpenGroupClient::new(ctx, identity);

        let messages = client.get_messages(&server.uri(), 1).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_clears_token_and_fails_with_token_expired() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let identity = Arc::new(Identity::from_secret_bytes(&Keypair::generate(&mut OsRng).secret.to_bytes()).unwrap());
        let storage = Arc::new(InMemoryStorage::new());
        storage.set_auth_token(&server.uri(), Some("stale-token".into())).await;
        let ctx = NetworkContext::new(NetworkConfig::default(), storage.clone());
        let client = OpenGroupClient::new(ctx, identity);

        let err = client.set_display_name(&server.uri(), "bob").await.unwrap_err();
        assert!(matches!(err, NetworkError::TokenExpired));
        assert!(storage.get_auth_token(&server.uri()).await.is_none());
    }
}
