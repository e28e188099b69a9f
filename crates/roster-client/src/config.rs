use std::time::Duration;

use roster_types::{Result, RosterError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Where the directory service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Read `ROSTER_API_URL` and `ROSTER_TIMEOUT_SECS`, falling back to the
    /// local development server with no timeout.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("ROSTER_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout = match std::env::var("ROSTER_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout(&raw)?),
            Err(_) => None,
        };
        Ok(Self::default().with_base_url(base_url).with_timeout(timeout))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| RosterError::Other(format!("Invalid ROSTER_TIMEOUT_SECS '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_server() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = ClientConfig::default().with_base_url("http://directory.internal:8080/");
        assert_eq!(config.base_url, "http://directory.internal:8080");
    }

    #[test]
    fn timeout_parses_seconds() {
        assert_eq!(parse_timeout(" 15 ").unwrap(), Duration::from_secs(15));
        assert!(parse_timeout("soon").is_err());
    }
}
