//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! used for both the index page fetch and the extract download.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{FetchError, FetchResult};

/// Configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Time budget for the whole index page request
    pub page_timeout: Duration,
    /// Connect timeout, applied to every request
    pub connect_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Render a progress bar while downloading
    pub show_progress: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_timeout: http::PAGE_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
            show_progress: true,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    ///
    /// No overall request timeout is set on the client: national extracts
    /// take minutes to transfer. The page fetch applies its own per-request
    /// budget instead.
    pub fn build_http_client(&self) -> FetchResult<Client> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(FetchError::ClientBuild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.page_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("OSM-Router/"));
        assert!(config.show_progress);
    }

    #[test]
    fn test_http_client_with_custom_config() {
        let config = ClientConfig {
            page_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            ..Default::default()
        };

        assert!(config.build_http_client().is_ok());
    }
}
