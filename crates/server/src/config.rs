//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_EMAIL` - Email of the bootstrap admin account
//! - `ADMIN_PASSWORD` - Password of the bootstrap admin account
//! - `VK_BOT_TOKEN` - VK community access token
//! - `VK_GROUP_ID` - VK community (group) ID
//!
//! ## Optional
//! - `SERVER_HOST` - Bind address (default: 127.0.0.1)
//! - `SERVER_PORT` - Listen port (default: 8080)
//! - `SERVER_BASE_URL` - Public URL; `https://` enables secure cookies (default: <http://localhost:8080>)
//! - `VK_API_BASE` - VK API method endpoint (default: <https://api.vk.com/method/>)
//! - `VK_API_VERSION` - VK API version (default: 5.131)
//! - `VK_POLL_WAIT_SECS` - Long-poll hold duration requested from the server (default: 25)
//! - `POLLER_BACKOFF_MS` - Pause after a failed poll iteration (default: 1000)
//! - `BOT_GREETING` - Reply sent to every new message
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use quizbot_core::Email;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_VK_API_BASE: &str = "https://api.vk.com/method/";
const DEFAULT_VK_API_VERSION: &str = "5.131";
const DEFAULT_POLL_WAIT_SECS: u64 = 25;
const DEFAULT_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_GREETING: &str = "Hi! I'm the quiz bot. Questions are coming soon!";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the admin API
    pub base_url: String,
    /// Bootstrap admin credentials
    pub admin: AdminBootstrapConfig,
    /// VK bot configuration
    pub vk: VkConfig,
    /// Bot behaviour
    pub bot: BotConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Credentials of the admin created at startup.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminBootstrapConfig {
    pub email: Email,
    pub password: SecretString,
}

impl std::fmt::Debug for AdminBootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrapConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// VK API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct VkConfig {
    /// Community access token
    pub token: SecretString,
    /// Community (group) ID
    pub group_id: i64,
    /// Method endpoint, ending with a slash
    pub api_base: Url,
    /// API version sent as `v`
    pub api_version: String,
    /// Long-poll hold duration requested from the server
    pub poll_wait: Duration,
}

impl std::fmt::Debug for VkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VkConfig")
            .field("token", &"[REDACTED]")
            .field("group_id", &self.group_id)
            .field("api_base", &self.api_base.as_str())
            .field("api_version", &self.api_version)
            .field("poll_wait", &self.poll_wait)
            .finish()
    }
}

/// Bot behaviour configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Text sent in reply to every new message
    pub greeting: String,
    /// Pause after a failed poll iteration
    pub backoff: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the VK token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SERVER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVER_HOST".to_string(), e.to_string()))?;
        let port = parse_env("SERVER_PORT", "8080")?;
        let base_url = get_env_or_default("SERVER_BASE_URL", "http://localhost:8080");

        let admin = AdminBootstrapConfig::from_env()?;
        let vk = VkConfig::from_env()?;
        let bot = BotConfig::from_env()?;

        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            admin,
            vk,
            bot,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AdminBootstrapConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_email = get_required_env("ADMIN_EMAIL")?;
        let email = Email::parse(&raw_email)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string()))?;

        let password = get_required_env("ADMIN_PASSWORD")?;
        if password.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_PASSWORD".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            email,
            password: SecretString::from(password),
        })
    }
}

impl VkConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let token = get_validated_secret("VK_BOT_TOKEN")?;
        let group_id = get_required_env("VK_GROUP_ID")?
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidEnvVar("VK_GROUP_ID".to_string(), e.to_string()))?;
        let api_base = parse_api_base(&get_env_or_default("VK_API_BASE", DEFAULT_VK_API_BASE))?;
        let poll_wait = Duration::from_secs(parse_env(
            "VK_POLL_WAIT_SECS",
            &DEFAULT_POLL_WAIT_SECS.to_string(),
        )?);

        Ok(Self {
            token,
            group_id,
            api_base,
            api_version: get_env_or_default("VK_API_VERSION", DEFAULT_VK_API_VERSION),
            poll_wait,
        })
    }
}

impl BotConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backoff_ms: u64 = parse_env("POLLER_BACKOFF_MS", &DEFAULT_BACKOFF_MS.to_string())?;

        Ok(Self {
            greeting: get_env_or_default("BOT_GREETING", DEFAULT_GREETING),
            backoff: Duration::from_millis(backoff_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the VK method endpoint, forcing a trailing slash so that
/// `Url::join("messages.send")` appends rather than replaces the last segment.
fn parse_api_base(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("VK_API_BASE".to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vk_config(token: &str) -> VkConfig {
        VkConfig {
            token: SecretString::from(token.to_string()),
            group_id: 123_456,
            api_base: parse_api_base(DEFAULT_VK_API_BASE).unwrap(),
            api_version: DEFAULT_VK_API_VERSION.to_string(),
            poll_wait: Duration::from_secs(DEFAULT_POLL_WAIT_SECS),
        }
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("vk1.a.Zx9Qp2Lm7Rt4Wn8Ys3") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        let err = validate_secret_strength("your-vk-token-here", "VK_BOT_TOKEN").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("CHANGEME-aB3xY9mK2nL5", "VK_BOT_TOKEN").is_err());
    }

    #[test]
    fn test_validate_secret_strength_rejects_low_entropy() {
        let result = validate_secret_strength(&"1".repeat(40), "VK_BOT_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_accepts_real_token() {
        assert!(validate_secret_strength("vk1.a.Zx9Qp2Lm7Rt4Wn8Ys3Kd6Hf0", "VK_BOT_TOKEN").is_ok());
    }

    #[test]
    fn test_parse_api_base_adds_trailing_slash() {
        let url = parse_api_base("http://127.0.0.1:9000/method").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/method/");
        assert_eq!(
            url.join("messages.send").unwrap().as_str(),
            "http://127.0.0.1:9000/method/messages.send"
        );
    }

    #[test]
    fn test_parse_api_base_rejects_garbage() {
        assert!(matches!(
            parse_api_base("not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_vk_config_debug_redacts_token() {
        let debug_output = format!("{:?}", vk_config("vk1.a.super-private-token"));

        assert!(debug_output.contains("123456"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-private-token"));
    }

    #[test]
    fn test_admin_bootstrap_debug_redacts_password() {
        let config = AdminBootstrapConfig {
            email: Email::parse("admin@example.com").unwrap(),
            password: SecretString::from("hunter2-but-longer".to_string()),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("admin@example.com"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_socket_addr_and_secure_cookies() {
        let config = ServerConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            base_url: "https://quiz.example.org".to_string(),
            admin: AdminBootstrapConfig {
                email: Email::parse("admin@example.com").unwrap(),
                password: SecretString::from("pass".to_string()),
            },
            vk: vk_config("vk1.a.Zx9Qp2Lm7Rt4Wn8Ys3"),
            bot: BotConfig::default(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_bot_config_defaults() {
        let bot = BotConfig::default();
        assert_eq!(bot.greeting, DEFAULT_GREETING);
        assert_eq!(bot.backoff, Duration::from_secs(1));
    }
}
