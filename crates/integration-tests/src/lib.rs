//! Integration tests for the quiz bot server.
//!
//! Each test starts the admin API in-process on an ephemeral port and talks
//! to it over real HTTP with a cookie-enabled `reqwest` client.
//!
//! ```bash
//! cargo test -p quizbot-integration-tests
//! ```

use reqwest::Client;
use secrecy::SecretString;

use quizbot_core::Email;
use quizbot_server::routes::build_router;
use quizbot_server::services::AdminAuthService;
use quizbot_server::state::AppState;
use quizbot_server::store::Database;

/// Email of the admin created for every test server.
pub const ADMIN_EMAIL: &str = "admin@quiz.local";

/// Password of the admin created for every test server.
pub const ADMIN_PASSWORD: &str = "integration-pass-42";

/// A running server and a client bound to it.
pub struct TestContext {
    /// Client with its own cookie jar.
    pub client: Client,
    /// Base URL of the server, without trailing slash.
    pub base_url: String,
}

impl TestContext {
    /// Start a fresh server with the test admin bootstrapped.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start() -> Self {
        let state = AppState::new(Database::new());
        AdminAuthService::new(state.db())
            .bootstrap(
                Email::parse(ADMIN_EMAIL).expect("valid email"),
                &SecretString::from(ADMIN_PASSWORD.to_string()),
            )
            .await
            .expect("Failed to bootstrap admin");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let app = build_router(state, false);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            client: Self::new_client(),
            base_url: format!("http://{addr}"),
        }
    }

    /// A client with an empty cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new_client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL for a path on the test server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
