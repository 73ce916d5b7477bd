//! VK API wire types.
//!
//! Only the fields the bot reads are modelled; everything else in the
//! payloads is ignored by serde.

use serde::{Deserialize, Deserializer};

use quizbot_core::InboundMessage;

/// Envelope returned by every VK API method.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VkResponse<T> {
    /// Successful call.
    Ok {
        /// Method result.
        response: T,
    },
    /// Failed call.
    Err {
        /// Error details.
        error: ApiError,
    },
}

/// Structured VK API error.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Numeric error code (e.g. 5 for an invalid token).
    pub error_code: i64,
    /// Error description.
    #[serde(default)]
    pub error_msg: String,
}

/// Result of `groups.getLongPollServer`.
#[derive(Debug, Clone, Deserialize)]
pub struct LongPollServer {
    /// Session key for `a_check` requests.
    pub key: String,
    /// Long-poll server URL.
    pub server: String,
    /// Starting event number.
    #[serde(deserialize_with = "deserialize_ts")]
    pub ts: i64,
}

/// Body returned by the long-poll server.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PollResponse {
    /// The server refused the request and asks for recovery.
    Failed {
        /// Failure code: 1 = history outdated, 2 = key expired, 3 = information lost.
        failed: i64,
        /// New event number (sent with code 1).
        #[serde(default, deserialize_with = "deserialize_opt_ts")]
        ts: Option<i64>,
    },
    /// A batch of events.
    Updates {
        /// Event number to use for the next request.
        #[serde(deserialize_with = "deserialize_ts")]
        ts: i64,
        /// Events since the previous `ts`.
        updates: Vec<RawUpdate>,
    },
}

/// A single event as sent by the long-poll server.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUpdate {
    /// Event type, e.g. `message_new`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event payload; its shape depends on `kind`.
    #[serde(default)]
    pub object: serde_json::Value,
}

/// Payload of a `message_new` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageNewObject {
    pub message: VkMessage,
}

/// A private message as described by the VK API.
#[derive(Debug, Clone, Deserialize)]
pub struct VkMessage {
    pub id: i64,
    pub from_id: i64,
    #[serde(default)]
    pub text: String,
}

impl From<VkMessage> for InboundMessage {
    fn from(message: VkMessage) -> Self {
        Self {
            id: message.id,
            sender_id: message.from_id,
            text: message.text,
        }
    }
}

/// Acknowledgement of `messages.send`.
///
/// The body is only checked for being a JSON object; an `error` field is
/// surfaced for logging.
#[derive(Debug, Deserialize)]
pub struct SendAck {
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// VK sends event numbers as strings in some responses and as integers in others.
#[derive(Deserialize)]
#[serde(untagged)]
enum TsRepr {
    Int(i64),
    Str(String),
}

impl TsRepr {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Int(ts) => Ok(ts),
            Self::Str(s) => s
                .parse()
                .map_err(|_| E::custom(format!("invalid ts value: {s:?}"))),
        }
    }
}

fn deserialize_ts<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    TsRepr::deserialize(deserializer)?.into_i64()
}

fn deserialize_opt_ts<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TsRepr>::deserialize(deserializer)?
        .map(TsRepr::into_i64)
        .transpose()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_long_poll_server_accepts_string_ts() {
        let parsed: VkResponse<LongPollServer> = serde_json::from_value(json!({
            "response": {"key": "K", "server": "https://lp.vk.com/wh1", "ts": "100"}
        }))
        .expect("valid response");

        let VkResponse::Ok { response } = parsed else {
            panic!("expected a successful response");
        };
        assert_eq!(response.key, "K");
        assert_eq!(response.ts, 100);
    }

    #[test]
    fn test_error_envelope() {
        let parsed: VkResponse<LongPollServer> = serde_json::from_value(json!({
            "error": {"error_code": 5, "error_msg": "User authorization failed"}
        }))
        .expect("valid error");

        assert!(matches!(
            parsed,
            VkResponse::Err { error } if error.error_code == 5
        ));
    }

    #[test]
    fn test_poll_response_failed_with_ts() {
        let parsed: PollResponse =
            serde_json::from_value(json!({"failed": 1, "ts": 150})).expect("valid");
        assert!(matches!(parsed, PollResponse::Failed { failed: 1, ts: Some(150) }));
    }

    #[test]
    fn test_poll_response_failed_without_ts() {
        let parsed: PollResponse = serde_json::from_value(json!({"failed": 2})).expect("valid");
        assert!(matches!(parsed, PollResponse::Failed { failed: 2, ts: None }));
    }

    #[test]
    fn test_poll_response_updates() {
        let parsed: PollResponse = serde_json::from_value(json!({
            "ts": "101",
            "updates": [{
                "type": "message_new",
                "object": {"message": {"id": 7, "from_id": 42, "text": "hi", "peer_id": 42}},
                "group_id": 1,
                "event_id": "abc"
            }]
        }))
        .expect("valid");

        let PollResponse::Updates { ts, updates } = parsed else {
            panic!("expected updates");
        };
        assert_eq!(ts, 101);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind, "message_new");
    }

    #[test]
    fn test_poll_response_rejects_unknown_shape() {
        assert!(serde_json::from_value::<PollResponse>(json!({"ts": 1})).is_err());
        assert!(serde_json::from_value::<PollResponse>(json!({"ts": "abc", "updates": []})).is_err());
    }
}
