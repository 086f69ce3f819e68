//! Connection manager configuration.

use std::time::Duration;

use url::Url;

use crate::error::{NetworkError, Result};

/// Default server endpoint; the conversation ID is appended as a path segment.
pub const DEFAULT_BASE_URL: &str = "ws://localhost:8000/ws";

/// Configuration for a [`ConnectionManager`](super::ConnectionManager).
///
/// Retry delays follow `initial_delay * backoff_multiplier^attempt`, capped at
/// `max_delay`, where `attempt` is the 1-based number of the retry being
/// scheduled. With the defaults that gives 2 s, 4 s, 8 s.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// WebSocket endpoint the conversation ID is appended to.
    pub base_url: String,
    /// Automatic reconnections allowed before giving up.
    pub max_reconnect_attempts: u32,
    /// Base delay for the backoff computation.
    pub initial_delay: Duration,
    /// Upper bound on any single retry delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_reconnect_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
        }
    }
}

impl SessionConfig {
    /// Create a configuration for the given endpoint with default retry policy.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the maximum number of automatic reconnections.
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Set the base delay.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate the delay before retry number `attempt`.
    ///
    /// No jitter is applied: the retry notice tells the user the exact delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay_ms = self.initial_delay.as_millis() as f64;
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = base_delay_ms * self.backoff_multiplier.powi(exponent);
        let delay_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(delay_ms.max(0.0) as u64)
    }

    /// Build the socket URL for a conversation.
    ///
    /// The ID is percent-encoded as a single path segment. Reconnection
    /// attempts carry `reconnect=true` so the server can resume the session.
    pub fn endpoint(&self, conversation_id: &str, is_reconnect: bool) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(NetworkError::InvalidUrl(format!(
                    "unsupported scheme '{other}', expected ws or wss"
                )));
            }
        }

        url.path_segments_mut()
            .map_err(|_| NetworkError::InvalidUrl(format!("'{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(conversation_id);

        if is_reconnect {
            url.query_pairs_mut().append_pair("reconnect", "true");
        }

        Ok(url)
    }
}
