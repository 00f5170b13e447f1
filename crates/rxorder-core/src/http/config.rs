//! Client configuration.

use std::time::Duration;

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "http://192.168.29.97:3000";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Sent as `dev` on the auth endpoints; the backend skips real SMS delivery.
    pub dev_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            dev_mode: true,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL taken from `API_BASE_URL` when set.
    pub fn from_env() -> Self {
        Self::from_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    fn from_base_url_override(base_url: Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = base_url.map(|u| u.trim().to_string()) {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// Join `path` onto the base URL with exactly one slash between them.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
