//! Startup configuration.
//!
//! Hosts hand Gatekeeper a flat map of init parameters (servlet-style
//! `key → value` strings). Where they come from (files, env, a
//! deployment descriptor) is the host's business.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use gatekeeper_session::SessionConfig;
use serde::Deserialize;

const GUEST_USER_ID: &str = "guestUserId";
const SESSION_TTL_SECONDS: &str = "sessionTtlSeconds";
const RENEW_WINDOW_SECONDS: &str = "renewWindowSeconds";

/// Errors raised while reading init parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("InitInfo must contain {0}")]
    MissingKey(String),

    #[error("InitInfo value {value:?} for {key} is not valid")]
    InvalidValue { key: String, value: String },
}

/// Everything Gatekeeper needs to start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    pub session: SessionConfig,

    /// Storage id of the user returned for token-less requests. Passed to
    /// resolver factories; the session cache itself never reads it.
    pub guest_user_id: String,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            guest_user_id: "guest".to_string(),
        }
    }
}

impl GatekeeperConfig {
    /// Builds a config from init parameters.
    ///
    /// `guestUserId` is required. `sessionTtlSeconds` and
    /// `renewWindowSeconds` override the session defaults.
    ///
    /// # Errors
    /// - [`ConfigError::MissingKey`]: `guestUserId` absent
    /// - [`ConfigError::InvalidValue`]: a duration is not a whole number
    pub fn from_init_info(
        init_info: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let guest_user_id = required(init_info, GUEST_USER_ID)?.to_string();

        let mut session = SessionConfig::default();
        if let Some(secs) = optional::<u64>(init_info, SESSION_TTL_SECONDS)? {
            session.session_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = optional::<u64>(init_info, RENEW_WINDOW_SECONDS)? {
            session.renew_window = Duration::from_secs(secs);
        }

        Ok(Self {
            session,
            guest_user_id,
        })
    }
}

fn required<'a>(
    init_info: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, ConfigError> {
    let Some(value) = init_info.get(key) else {
        tracing::error!(key, "required init parameter missing");
        return Err(ConfigError::MissingKey(key.to_string()));
    };
    tracing::info!(key, value = %value, "found init parameter");
    Ok(value)
}

fn optional<T: FromStr>(
    init_info: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = init_info.get(key) else {
        return Ok(None);
    };
    let parsed = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.clone(),
    })?;
    tracing::info!(key, value = %raw, "found init parameter");
    Ok(Some(parsed))
}
