//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start against a
//! local backend with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use spektr_shared::constants::{DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS, POLL_INTERVAL};

use crate::api::Endpoints;
use crate::auth::AuthMode;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend endpoint URLs.
    /// Env: `SPEKTR_API_BASE`, then per endpoint `SPEKTR_AUTH_URL`,
    /// `SPEKTR_USERS_URL`, `SPEKTR_CHATS_URL`, `SPEKTR_MESSAGES_URL`,
    /// `SPEKTR_UPLOAD_URL`.
    /// Default: derived from `http://127.0.0.1:8080`
    pub endpoints: Endpoints,

    /// How often an open conversation reloads its history.
    /// Env: `SPEKTR_POLL_INTERVAL_MS`
    /// Default: 3000
    pub poll_interval: Duration,

    /// Timeout applied to every backend call.
    /// Env: `SPEKTR_REQUEST_TIMEOUT_SECS`
    /// Default: 15
    pub request_timeout: Duration,

    /// Whether sign-in ends with a local 6-digit code step.
    /// Env: `SPEKTR_VERIFY_CODE` (true/false)
    /// Default: `false`
    pub auth_mode: AuthMode,

    /// Directory holding `spektr.db`.
    /// Env: `SPEKTR_DATA_DIR`
    /// Default: `None` (platform data directory).
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::from_base(DEFAULT_API_BASE),
            poll_interval: POLL_INTERVAL,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auth_mode: AuthMode::Password,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup("SPEKTR_API_BASE") {
            config.endpoints = Endpoints::from_base(&base);
        }

        let overrides: [(&str, &mut String); 5] = [
            ("SPEKTR_AUTH_URL", &mut config.endpoints.auth),
            ("SPEKTR_USERS_URL", &mut config.endpoints.users),
            ("SPEKTR_CHATS_URL", &mut config.endpoints.chats),
            ("SPEKTR_MESSAGES_URL", &mut config.endpoints.messages),
            ("SPEKTR_UPLOAD_URL", &mut config.endpoints.upload),
        ];
        for (key, slot) in overrides {
            if let Some(url) = lookup(key) {
                *slot = url;
            }
        }

        if let Some(val) = lookup("SPEKTR_POLL_INTERVAL_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid SPEKTR_POLL_INTERVAL_MS, using default"),
            }
        }

        if let Some(val) = lookup("SPEKTR_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid SPEKTR_REQUEST_TIMEOUT_SECS, using default"
                ),
            }
        }

        if let Some(val) = lookup("SPEKTR_VERIFY_CODE") {
            config.auth_mode = if val != "false" && val != "0" {
                AuthMode::Verified
            } else {
                AuthMode::Password
            };
        }

        if let Some(dir) = lookup("SPEKTR_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        config
    }
}
