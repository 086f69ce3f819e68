//! Client settings, layered from a TOML file, the environment and the CLI.
//!
//! Later layers win: a settings file replaces the defaults, environment
//! variables replace the file, and command-line flags replace both.
//!
//! ```toml
//! url = "wss://chat.example.com/ws"
//! max_reconnect_attempts = 5
//! initial_delay_ms = 500
//!
//! [headers]
//! Authorization = "Bearer token"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parley_net::{SessionConfig, WsTransportConfig};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ClientSettings::url`].
pub const ENV_URL: &str = "PARLEY_URL";
/// Environment variable overriding [`ClientSettings::max_reconnect_attempts`].
pub const ENV_MAX_RECONNECT_ATTEMPTS: &str = "PARLEY_MAX_RECONNECT_ATTEMPTS";

/// Error loading or validating settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// The settings file could not be read.
    Io { path: PathBuf, message: String },
    /// The settings file is not valid TOML or has unknown keys.
    Parse(String),
    /// A setting has an unusable value.
    InvalidValue { key: String, value: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "cannot read settings file {}: {message}", path.display())
            }
            Self::Parse(msg) => write!(f, "invalid settings: {msg}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: '{value}'"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Everything the `parley` binary can be configured with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    /// WebSocket endpoint the conversation ID is appended to.
    pub url: String,
    /// Automatic reconnections before giving up.
    pub max_reconnect_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// How long a close waits for the server's close frame.
    pub close_timeout_ms: u64,
    /// Extra handshake headers.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        let session = SessionConfig::default();
        let transport = WsTransportConfig::default();
        Self {
            url: session.base_url,
            max_reconnect_attempts: session.max_reconnect_attempts,
            initial_delay_ms: duration_ms(session.initial_delay),
            max_delay_ms: duration_ms(session.max_delay),
            backoff_multiplier: session.backoff_multiplier,
            close_timeout_ms: duration_ms(transport.close_timeout),
            headers: BTreeMap::new(),
        }
    }
}

impl ClientSettings {
    /// Read settings from a TOML file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| SettingsError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|err| SettingsError::Parse(err.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            self.url = url;
        }

        if let Some(raw) = lookup(ENV_MAX_RECONNECT_ATTEMPTS) {
            self.max_reconnect_attempts =
                raw.trim()
                    .parse()
                    .map_err(|_| SettingsError::InvalidValue {
                        key: ENV_MAX_RECONNECT_ATTEMPTS.to_string(),
                        value: raw.clone(),
                    })?;
        }

        Ok(())
    }

    /// Reject values the retry policy cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.url.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                key: "url".into(),
                value: self.url.clone(),
            });
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(SettingsError::InvalidValue {
                key: "backoff_multiplier".into(),
                value: self.backoff_multiplier.to_string(),
            });
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(SettingsError::InvalidValue {
                key: "max_delay_ms".into(),
                value: self.max_delay_ms.to_string(),
            });
        }

        Ok(())
    }

    /// Retry policy and endpoint for the connection manager.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.url.clone())
            .max_reconnect_attempts(self.max_reconnect_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .backoff_multiplier(self.backoff_multiplier)
    }

    /// Handshake headers and close timeout for the transport.
    pub fn transport_config(&self) -> WsTransportConfig {
        WsTransportConfig::new()
            .headers(self.headers.clone())
            .close_timeout(Duration::from_millis(self.close_timeout_ms))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
