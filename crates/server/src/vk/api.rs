//! VK API method client.
//!
//! Thin wrapper over the HTTP calls the bot needs. Recovery logic lives in
//! [`super::LongPollClient`]; this type only performs requests and decodes
//! their bodies.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use quizbot_core::OutboundMessage;

use super::error::VkError;
use super::types::{LongPollServer, PollResponse, SendAck, VkResponse};
use crate::config::VkConfig;

/// Connection establishment limit. Long-poll reads are left unbounded so the
/// server can hold the request for the full `wait` period.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// VK API client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct VkApi {
    client: Client,
    token: SecretString,
    group_id: i64,
    api_base: Url,
    api_version: String,
}

impl std::fmt::Debug for VkApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VkApi")
            .field("token", &"[REDACTED]")
            .field("group_id", &self.group_id)
            .field("api_base", &self.api_base.as_str())
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl VkApi {
    /// Create a new VK API client.
    ///
    /// # Errors
    ///
    /// Returns `VkError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &VkConfig) -> Result<Self, VkError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| VkError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            token: config.token.clone(),
            group_id: config.group_id,
            api_base: config.api_base.clone(),
            api_version: config.api_version.clone(),
        })
    }

    /// Call `groups.getLongPollServer`.
    ///
    /// # Errors
    ///
    /// Returns `VkError::Upstream` if VK reports an error, `VkError::Transport`
    /// if the request fails, and `VkError::Protocol` for unexpected bodies.
    #[instrument(skip(self), fields(group_id = self.group_id))]
    pub async fn get_long_poll_server(&self) -> Result<LongPollServer, VkError> {
        let group_id = self.group_id.to_string();
        let url = self.method_url(
            "groups.getLongPollServer",
            &[("group_id", group_id.as_str())],
        )?;

        match self.get_json::<VkResponse<LongPollServer>>(url).await? {
            VkResponse::Ok { response } => {
                debug!(server = %response.server, ts = response.ts, "Long-poll server acquired");
                Ok(response)
            }
            VkResponse::Err { error } => Err(VkError::Upstream {
                code: error.error_code,
                message: error.error_msg,
            }),
        }
    }

    /// Wait for events on the long-poll server (`act=a_check`).
    ///
    /// # Errors
    ///
    /// Returns `VkError::Transport` if the request fails and
    /// `VkError::Protocol` if the body is not a recognised poll response.
    #[instrument(skip(self, key))]
    pub async fn check_long_poll(
        &self,
        server: &str,
        key: &str,
        ts: i64,
        wait: Duration,
    ) -> Result<PollResponse, VkError> {
        let mut url = parse_server_url(server)?;
        url.query_pairs_mut()
            .append_pair("act", "a_check")
            .append_pair("key", key)
            .append_pair("ts", &ts.to_string())
            .append_pair("wait", &wait.as_secs().to_string());

        self.get_json(url).await
    }

    /// Call `messages.send`.
    ///
    /// Delivery is fire-and-forget: a valid JSON acknowledgement is enough,
    /// and an error inside it is only logged.
    ///
    /// # Errors
    ///
    /// Returns `VkError::Transport` if the request fails and
    /// `VkError::Protocol` if the acknowledgement is not valid JSON.
    #[instrument(skip(self, message), fields(recipient_id = message.recipient_id))]
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<(), VkError> {
        let user_id = message.recipient_id.to_string();
        let url = self.method_url(
            "messages.send",
            &[
                ("user_id", user_id.as_str()),
                ("message", message.text.as_str()),
                ("random_id", "0"),
            ],
        )?;

        let ack: SendAck = self.get_json(url).await?;
        if let Some(error) = ack.error {
            warn!(
                code = error.error_code,
                error = %error.error_msg,
                "VK rejected messages.send"
            );
        } else {
            debug!(response = ?ack.response, "Message sent");
        }

        Ok(())
    }

    /// Build a method URL with the common `access_token` and `v` parameters.
    fn method_url(&self, method: &str, params: &[(&str, &str)]) -> Result<Url, VkError> {
        let mut url = self
            .api_base
            .join(method)
            .map_err(|e| VkError::Protocol(format!("invalid method URL for {method}: {e}")))?;

        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("access_token", self.token.expose_secret())
            .append_pair("v", &self.api_version);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, VkError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VkError::Transport(format!("HTTP {status}")));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| VkError::Protocol(e.to_string()))
    }
}

/// Long-poll server addresses are returned with a scheme by current API
/// versions and without one by older versions.
fn parse_server_url(server: &str) -> Result<Url, VkError> {
    Url::parse(server)
        .or_else(|_| Url::parse(&format!("https://{server}")))
        .map_err(|e| VkError::Protocol(format!("invalid long-poll server {server:?}: {e}")))
}
