//! HTTP client for the remote extract index
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: page fetch and streaming responses
//! - `download`: file download operations with atomic writes
//!
//! [`RemoteSource`] is the seam between the change-aware downloader and the
//! network; [`GeofabrikClient`] is its production implementation.

use std::path::Path;

use url::Url;

use crate::errors::{DownloadResult, FetchResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;

use download::DownloadHandler;
use http::HttpHandler;

/// Network operations needed to acquire a dataset
#[allow(async_fn_in_trait)]
pub trait RemoteSource {
    /// Retrieves the HTML of an index page
    async fn fetch_page(&self, url: &Url) -> FetchResult<String>;

    /// Streams the resource at `url` to `destination`, returning bytes written
    async fn download(&self, url: &Url, destination: &Path) -> DownloadResult<u64>;
}

/// HTTP client for Geofabrik-style download servers
#[derive(Debug, Clone)]
pub struct GeofabrikClient {
    http_handler: HttpHandler,
    show_progress: bool,
}

impl GeofabrikClient {
    /// Creates a client with default configuration
    pub fn new() -> FetchResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::ClientBuild` if the HTTP client cannot be created
    pub fn with_config(config: ClientConfig) -> FetchResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.page_timeout);

        tracing::debug!(
            "Created HTTP client (page timeout {:?}, connect timeout {:?})",
            config.page_timeout,
            config.connect_timeout
        );

        Ok(Self {
            http_handler,
            show_progress: config.show_progress,
        })
    }
}

impl RemoteSource for GeofabrikClient {
    async fn fetch_page(&self, url: &Url) -> FetchResult<String> {
        self.http_handler.get_page(url).await
    }

    async fn download(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        DownloadHandler::new(&self.http_handler, self.show_progress)
            .download_file(url, destination)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GeofabrikClient::new();
        assert!(client.is_ok());
        assert!(client.unwrap().show_progress);
    }

    #[test]
    fn test_client_quiet_config() {
        let config = ClientConfig {
            show_progress: false,
            ..Default::default()
        };
        let client = GeofabrikClient::with_config(config).unwrap();
        assert!(!client.show_progress);
    }
}
