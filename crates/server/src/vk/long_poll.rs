//! Bots Long Poll session management.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use quizbot_core::{OutboundMessage, Update};

use super::api::VkApi;
use super::error::VkError;
use super::types::{MessageNewObject, PollResponse, RawUpdate};

/// Event type of a new incoming message.
const MESSAGE_NEW: &str = "message_new";

/// Credentials for the long-poll server.
///
/// Held as a whole inside an `Option`, so the client is either
/// uninitialized or has all three values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSession {
    pub key: String,
    pub server: String,
    pub ts: i64,
}

/// Long-poll client.
///
/// Owns the [`PollSession`] and is driven by a single task; `fetch` takes
/// `&mut self` so concurrent polls on the same session cannot compile.
#[derive(Debug)]
pub struct LongPollClient {
    api: VkApi,
    wait: Duration,
    session: Option<PollSession>,
}

impl LongPollClient {
    /// Create a client with no session. The first `fetch` acquires one.
    #[must_use]
    pub const fn new(api: VkApi, wait: Duration) -> Self {
        Self {
            api,
            wait,
            session: None,
        }
    }

    /// Current session, if acquired.
    #[must_use]
    pub const fn session(&self) -> Option<&PollSession> {
        self.session.as_ref()
    }

    /// Request a fresh key, server and timestamp.
    ///
    /// On failure the previous session (if any) is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `VkError::Upstream` when VK reports an error (for example an
    /// invalid token), `VkError::Transport` when the request fails.
    #[instrument(skip(self))]
    pub async fn acquire(&mut self) -> Result<&PollSession, VkError> {
        let lp = self.api.get_long_poll_server().await?;
        info!(server = %lp.server, ts = lp.ts, "Long-poll session acquired");

        Ok(self.session.insert(PollSession {
            key: lp.key,
            server: lp.server,
            ts: lp.ts,
        }))
    }

    /// Wait for the next batch of updates.
    ///
    /// Acquires a session first if there is none. `message_new` events are
    /// decoded into messages; other event types pass through as
    /// [`Update::Other`]. Recovery responses return an empty batch:
    /// `failed: 1` adopts the server's `ts`, `failed: 2` and `failed: 3`
    /// re-acquire the session.
    ///
    /// # Errors
    ///
    /// Returns `VkError::Transport` for network failures, `VkError::Upstream`
    /// if re-acquisition is rejected, and `VkError::Protocol` for responses
    /// outside the documented shapes.
    #[instrument(skip(self))]
    pub async fn fetch(&mut self) -> Result<Vec<Update>, VkError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.acquire().await?.clone(),
        };

        let response = self
            .api
            .check_long_poll(&session.server, &session.key, session.ts, self.wait)
            .await;
        // Restore before inspecting the result so that errors keep the session.
        let session = self.session.insert(session);

        match response? {
            PollResponse::Updates { ts, updates } => {
                session.ts = ts;
                let batch = normalize(updates);
                debug!(ts, count = batch.len(), "Long-poll batch received");
                Ok(batch)
            }
            PollResponse::Failed { failed: 1, ts: Some(ts) } => {
                debug!(old_ts = session.ts, new_ts = ts, "Event history outdated, resyncing ts");
                session.ts = ts;
                Ok(Vec::new())
            }
            PollResponse::Failed { failed: code @ (2 | 3), .. } => {
                warn!(code, "Long-poll session invalidated, re-acquiring");
                self.acquire().await?;
                Ok(Vec::new())
            }
            PollResponse::Failed { failed, ts } => Err(VkError::Protocol(format!(
                "unexpected long-poll failure (failed={failed}, ts={ts:?})"
            ))),
        }
    }

    /// Send a message through the VK API.
    ///
    /// Does not touch the long-poll session, so it can run between fetches.
    ///
    /// # Errors
    ///
    /// Returns `VkError::Transport` if the request fails.
    pub async fn send(&self, message: &OutboundMessage) -> Result<(), VkError> {
        self.api.send_message(message).await
    }
}

/// Decode `message_new` payloads and tag every other event by its type.
///
/// A `message_new` event whose payload does not decode is dropped.
fn normalize(updates: Vec<RawUpdate>) -> Vec<Update> {
    updates
        .into_iter()
        .filter_map(|raw| {
            if raw.kind != MESSAGE_NEW {
                return Some(Update::Other(raw.kind));
            }
            match serde_json::from_value::<MessageNewObject>(raw.object) {
                Ok(object) => Some(Update::MessageNew(object.message.into())),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed message_new event");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;
    use url::Url;

    use quizbot_core::InboundMessage;

    use super::*;
    use crate::config::VkConfig;

    fn client_for(server: &MockServer) -> LongPollClient {
        let api = VkApi::new(&VkConfig {
            token: SecretString::from("vk1.a.Zx9Qp2Lm7Rt4Wn8Ys3".to_string()),
            group_id: 777,
            api_base: Url::parse(&server.url("/method/")).unwrap(),
            api_version: "5.131".to_string(),
            poll_wait: Duration::from_secs(25),
        })
        .unwrap();
        LongPollClient::new(api, Duration::from_secs(25))
    }

    async fn mock_acquire<'a>(server: &'a MockServer, key: &str, ts: i64) -> httpmock::Mock<'a> {
        let lp_url = server.url("/lp");
        let key = key.to_string();
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/groups.getLongPollServer");
                then.status(200).json_body(json!({
                    "response": {"key": key, "server": lp_url, "ts": ts.to_string()}
                }));
            })
            .await
    }

    #[tokio::test]
    async fn test_acquire_populates_session() {
        let server = MockServer::start_async().await;
        mock_acquire(&server, "K", 100).await;
        let mut client = client_for(&server);
        assert!(client.session().is_none());

        client.acquire().await.unwrap();

        let session = client.session().unwrap();
        assert_eq!(session.key, "K");
        assert_eq!(session.server, server.url("/lp"));
        assert_eq!(session.ts, 100);
    }

    #[tokio::test]
    async fn test_acquire_upstream_error_keeps_state_unset() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/groups.getLongPollServer");
                then.status(200).json_body(json!({
                    "error": {"error_code": 5, "error_msg": "invalid access_token"}
                }));
            })
            .await;
        let mut client = client_for(&server);

        let err = client.fetch().await.unwrap_err();

        assert!(matches!(err, VkError::Upstream { code: 5, .. }));
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_fetch_acquires_lazily_and_decodes_messages() {
        let server = MockServer::start_async().await;
        let acquire = mock_acquire(&server, "K", 100).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lp").query_param("ts", "100");
                then.status(200).json_body(json!({
                    "ts": "102",
                    "updates": [
                        {"type": "group_join", "object": {"user_id": 1}},
                        {"type": "message_new", "object": {"message": {"id": 5, "from_id": 42, "text": "hi"}}},
                        {"type": "message_new", "object": {"broken": true}}
                    ]
                }));
            })
            .await;
        let mut client = client_for(&server);

        let updates = client.fetch().await.unwrap();

        acquire.assert_async().await;
        assert_eq!(
            updates,
            vec![
                Update::Other("group_join".to_string()),
                Update::MessageNew(InboundMessage {
                    id: 5,
                    sender_id: 42,
                    text: "hi".to_string(),
                }),
            ]
        );
        assert_eq!(client.session().unwrap().ts, 102);
    }

    #[tokio::test]
    async fn test_failed_1_adopts_ts_without_reacquire() {
        let server = MockServer::start_async().await;
        let acquire = mock_acquire(&server, "K", 100).await;
        let drifted = server
            .mock_async(|when, then| {
                when.method(GET).path("/lp").query_param("ts", "100");
                then.status(200).json_body(json!({"failed": 1, "ts": 150}));
            })
            .await;
        let resumed = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/lp")
                    .query_param("key", "K")
                    .query_param("ts", "150");
                then.status(200).json_body(json!({"ts": "150", "updates": []}));
            })
            .await;
        let mut client = client_for(&server);
        client.acquire().await.unwrap();

        assert!(client.fetch().await.unwrap().is_empty());
        assert_eq!(
            client.session(),
            Some(&PollSession {
                key: "K".to_string(),
                server: server.url("/lp"),
                ts: 150,
            })
        );

        assert!(client.fetch().await.unwrap().is_empty());
        drifted.assert_calls_async(1).await;
        resumed.assert_calls_async(1).await;
        acquire.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_failed_1_without_ts_is_protocol_error() {
        let server = MockServer::start_async().await;
        mock_acquire(&server, "K", 100).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lp");
                then.status(200).json_body(json!({"failed": 1}));
            })
            .await;
        let mut client = client_for(&server);

        let err = client.fetch().await.unwrap_err();

        assert!(matches!(err, VkError::Protocol(_)));
        assert_eq!(client.session().unwrap().ts, 100);
    }

    async fn assert_reacquires_on(code: i64) {
        let server = MockServer::start_async().await;
        let mut first = mock_acquire(&server, "K1", 100).await;
        let expired = server
            .mock_async(|when, then| {
                when.method(GET).path("/lp").query_param("key", "K1");
                then.status(200).json_body(json!({"failed": code}));
            })
            .await;
        let mut client = client_for(&server);
        client.acquire().await.unwrap();
        first.delete_async().await;

        let second = mock_acquire(&server, "K2", 200).await;
        let resumed = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/lp")
                    .query_param("key", "K2")
                    .query_param("ts", "200");
                then.status(200).json_body(json!({
                    "ts": 201,
                    "updates": [
                        {"type": "message_new", "object": {"message": {"id": 9, "from_id": 7, "text": "again"}}}
                    ]
                }));
            })
            .await;

        assert!(client.fetch().await.unwrap().is_empty());
        second.assert_calls_async(1).await;
        assert_eq!(client.session().unwrap().key, "K2");

        let updates = client.fetch().await.unwrap();
        assert_eq!(updates.len(), 1);
        expired.assert_calls_async(1).await;
        resumed.assert_calls_async(1).await;
        second.assert_calls_async(1).await;
        assert_eq!(client.session().unwrap().ts, 201);
    }

    #[tokio::test]
    async fn test_failed_2_reacquires_once() {
        assert_reacquires_on(2).await;
    }

    #[tokio::test]
    async fn test_failed_3_reacquires_once() {
        assert_reacquires_on(3).await;
    }

    #[tokio::test]
    async fn test_unknown_failed_code_is_protocol_error() {
        let server = MockServer::start_async().await;
        let acquire = mock_acquire(&server, "K", 100).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lp");
                then.status(200).json_body(json!({"failed": 4, "min_version": 0, "max_version": 3}));
            })
            .await;
        let mut client = client_for(&server);

        let err = client.fetch().await.unwrap_err();

        assert!(matches!(err, VkError::Protocol(_)));
        acquire.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_transport_error_keeps_session() {
        let server = MockServer::start_async().await;
        mock_acquire(&server, "K", 100).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lp");
                then.status(503);
            })
            .await;
        let mut client = client_for(&server);

        let err = client.fetch().await.unwrap_err();

        assert!(matches!(err, VkError::Transport(_)));
        assert_eq!(client.session().unwrap().key, "K");
    }

    #[tokio::test]
    async fn test_send_leaves_session_alone() {
        let server = MockServer::start_async().await;
        mock_acquire(&server, "K", 100).await;
        let reply = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/method/messages.send")
                    .query_param("user_id", "42")
                    .query_param("message", "Hello");
                then.status(200).json_body(json!({"response": 1}));
            })
            .await;
        let mut client = client_for(&server);
        client.acquire().await.unwrap();

        client.send(&OutboundMessage::new(42, "Hello")).await.unwrap();

        reply.assert_async().await;
        assert_eq!(client.session().unwrap().ts, 100);
    }
}
