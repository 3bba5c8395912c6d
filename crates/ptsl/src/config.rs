//! Client configuration.
//!
//! Defaults suit a host on the local machine. `from_env` overlays `PTSL_*`
//! environment variables; durations are given in seconds and may be
//! fractional.

use std::time::Duration;

use crate::bridge::codec::DEFAULT_MAX_FRAME_LENGTH;
use crate::bridge::transport::Endpoint;
use crate::session::SessionSettings;
use crate::version::PROTOCOL_VERSION;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    pub connect_timeout: Duration,
    /// Default bound on a single request/response exchange.
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_task_wait: Duration,
    pub max_frame_length: usize,
    pub protocol_version: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            max_task_wait: Duration::from_secs(600),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    /// Defaults overlaid with `PTSL_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable lookup.
    /// Unparseable values are logged and ignored.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("PTSL_ENDPOINT") {
            match raw.parse::<Endpoint>() {
                Ok(endpoint) => config.endpoint = endpoint,
                Err(e) => tracing::warn!(error = %e, "Ignoring PTSL_ENDPOINT"),
            }
        }
        if let Some(d) = seconds(&lookup, "PTSL_CONNECT_TIMEOUT") {
            config.connect_timeout = d;
        }
        if let Some(d) = seconds(&lookup, "PTSL_REQUEST_TIMEOUT") {
            config.request_timeout = d;
        }
        if let Some(d) = seconds(&lookup, "PTSL_POLL_INTERVAL") {
            config.poll_interval = d;
        }
        if let Some(d) = seconds(&lookup, "PTSL_MAX_TASK_WAIT") {
            config.max_task_wait = d;
        }
        if let Some(raw) = lookup("PTSL_MAX_FRAME_BYTES") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_frame_length = n,
                _ => tracing::warn!(value = %raw, "Ignoring PTSL_MAX_FRAME_BYTES"),
            }
        }
        config
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_task_wait(mut self, max_wait: Duration) -> Self {
        self.max_task_wait = max_wait;
        self
    }

    pub fn with_max_frame_length(mut self, max: usize) -> Self {
        self.max_frame_length = max;
        self
    }

    pub fn with_protocol_version(mut self, version: u32) -> Self {
        self.protocol_version = version;
        self
    }

    pub(crate) fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            endpoint: self.endpoint.clone(),
            handshake_timeout: self.request_timeout,
            max_frame_length: self.max_frame_length,
            protocol_version: self.protocol_version,
        }
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Some(Duration::from_secs_f64(secs)),
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable duration");
            None
        }
    }
}
