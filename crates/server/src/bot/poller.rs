//! Supervised long-poll loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::dispatcher::UpdateDispatcher;
use crate::vk::{LongPollClient, VkError};

/// Client and dispatcher, owned by whoever is currently driving the loop.
type Parts = (LongPollClient, UpdateDispatcher);

/// Background task that feeds long-poll batches to the dispatcher.
///
/// The task takes ownership of the client and dispatcher while running and
/// hands them back when it exits, so the poller can be restarted with its
/// long-poll session and dedup state intact. If the task panics the parts
/// are lost and the poller cannot be started again.
pub struct Poller {
    running: Arc<AtomicBool>,
    backoff: Duration,
    idle: Option<Parts>,
    task: Option<JoinHandle<Parts>>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("running", &self.running.load(Ordering::Acquire))
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Create a stopped poller.
    #[must_use]
    pub fn new(client: LongPollClient, dispatcher: UpdateDispatcher, backoff: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            backoff,
            idle: Some((client, dispatcher)),
            task: None,
        }
    }

    /// Whether the loop has been started and not yet stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn the polling loop. Does nothing if it is already running.
    pub fn start(&mut self) {
        let Some(parts) = self.idle.take() else {
            if self.task.is_some() {
                warn!("Poller already running");
            } else {
                error!("Poller cannot restart after its task failed");
            }
            return;
        };

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        self.task = Some(tokio::spawn(run(parts, running, self.backoff)));
        info!(backoff_ms = self.backoff.as_millis(), "Poller started");
    }

    /// Ask the loop to finish and wait for it.
    ///
    /// An in-flight long-poll request is allowed to complete first, so this
    /// can take up to the configured poll wait. Does nothing if stopped.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        let Some(task) = self.task.take() else {
            return;
        };

        match task.await {
            Ok(parts) => {
                self.idle = Some(parts);
                info!("Poller stopped");
            }
            Err(e) => {
                error!(error = %e, "Poller task did not exit cleanly");
                sentry::capture_error(&e);
            }
        }
    }
}

async fn run(parts: Parts, running: Arc<AtomicBool>, backoff: Duration) -> Parts {
    let (mut client, mut dispatcher) = parts;

    while running.load(Ordering::Acquire) {
        if let Err(e) = poll_once(&mut client, &mut dispatcher).await {
            error!(error = %e, "Long-poll iteration failed");
            sentry::capture_error(&e);
            tokio::time::sleep(backoff).await;
        }
    }

    (client, dispatcher)
}

async fn poll_once(
    client: &mut LongPollClient,
    dispatcher: &mut UpdateDispatcher,
) -> Result<(), VkError> {
    let updates = client.fetch().await?;
    if updates.is_empty() {
        return Ok(());
    }

    let sent = dispatcher.handle(&*client, &updates).await?;
    debug!(received = updates.len(), sent, "Batch dispatched");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::VkConfig;
    use crate::vk::VkApi;

    fn parts_for(server: &MockServer) -> Parts {
        let api = VkApi::new(&VkConfig {
            token: SecretString::from("vk1.a.Zx9Qp2Lm7Rt4Wn8Ys3".to_string()),
            group_id: 777,
            api_base: Url::parse(&server.url("/method/")).unwrap(),
            api_version: "5.131".to_string(),
            poll_wait: Duration::from_secs(25),
        })
        .unwrap();
        (
            LongPollClient::new(api, Duration::from_secs(25)),
            UpdateDispatcher::new("Hello"),
        )
    }

    async fn wait_for_calls(mock: &httpmock::Mock<'_>, at_least: usize) {
        for _ in 0..200 {
            if mock.calls_async().await >= at_least {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected at least {at_least} calls");
    }

    #[tokio::test]
    async fn test_replies_to_new_messages() {
        let server = MockServer::start_async().await;
        let lp_url = server.url("/lp");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/groups.getLongPollServer");
                then.status(200)
                    .json_body(json!({"response": {"key": "K", "server": lp_url, "ts": "100"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lp").query_param("ts", "100");
                then.status(200).json_body(json!({
                    "ts": "101",
                    "updates": [
                        {"type": "message_new", "object": {"message": {"id": 1, "from_id": 42, "text": "hi"}}}
                    ]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lp").query_param("ts", "101");
                then.status(200)
                    .delay(Duration::from_millis(20))
                    .json_body(json!({"ts": "101", "updates": []}));
            })
            .await;
        let reply = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/method/messages.send")
                    .query_param("user_id", "42")
                    .query_param("message", "Hello");
                then.status(200).json_body(json!({"response": 1}));
            })
            .await;

        let (client, dispatcher) = parts_for(&server);
        let mut poller = Poller::new(client, dispatcher, Duration::from_millis(10));
        poller.start();
        assert!(poller.is_running());

        wait_for_calls(&reply, 1).await;
        poller.stop().await;

        assert!(!poller.is_running());
        reply.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_survives_fetch_errors() {
        let server = MockServer::start_async().await;
        let acquire = server
            .mock_async(|when, then| {
                when.method(GET).path("/method/groups.getLongPollServer");
                then.status(200).json_body(json!({
                    "error": {"error_code": 5, "error_msg": "User authorization failed"}
                }));
            })
            .await;

        let (client, dispatcher) = parts_for(&server);
        let mut poller = Poller::new(client, dispatcher, Duration::from_millis(10));
        poller.start();

        wait_for_calls(&acquire, 3).await;
        assert!(poller.is_running());

        poller.stop().await;
        assert!(!poller.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_and_stop_when_stopped_are_noops() {
        let server = MockServer::start_async().await;
        let acquire = server
            .mock_async(|when, then| {
                when.method(GET).path("/method/groups.getLongPollServer");
                then.status(500);
            })
            .await;

        let (client, dispatcher) = parts_for(&server);
        let mut poller = Poller::new(client, dispatcher, Duration::from_millis(10));

        poller.stop().await;
        assert!(!poller.is_running());

        poller.start();
        poller.start();
        wait_for_calls(&acquire, 1).await;
        poller.stop().await;

        // Restart after a clean stop reuses the returned client.
        poller.start();
        assert!(poller.is_running());
        poller.stop().await;
        assert!(!poller.is_running());
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_poll() {
        let server = MockServer::start_async().await;
        let lp_url = server.url("/lp");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/method/groups.getLongPollServer");
                then.status(200)
                    .json_body(json!({"response": {"key": "K", "server": lp_url, "ts": "100"}}));
            })
            .await;
        let slow = server
            .mock_async(|when, then| {
                when.method(GET).path("/lp").query_param("ts", "100");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(json!({"ts": "105", "updates": []}));
            })
            .await;

        let (client, dispatcher) = parts_for(&server);
        let mut poller = Poller::new(client, dispatcher, Duration::from_millis(10));
        poller.start();

        wait_for_calls(&slow, 1).await;
        poller.stop().await;

        slow.assert_calls_async(1).await;
        let (client, _) = poller.idle.as_ref().unwrap();
        assert_eq!(client.session().unwrap().ts, 105);
    }

    #[tokio::test]
    async fn test_start_after_failed_task_stays_stopped() {
        let server = MockServer::start_async().await;
        let (client, dispatcher) = parts_for(&server);
        let mut poller = Poller::new(client, dispatcher, Duration::from_millis(10));
        poller.start();

        poller.task.as_ref().unwrap().abort();
        poller.stop().await;
        assert!(poller.idle.is_none());

        poller.start();
        assert!(!poller.is_running());
        assert!(poller.task.is_none());
    }
}
