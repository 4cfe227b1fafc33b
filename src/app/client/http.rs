//! Core HTTP operations
//!
//! A single GET per call, no retry: failures surface to the caller, who
//! reruns the pipeline once the network is healthy.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::errors::{DownloadError, DownloadResult, FetchError, FetchResult};

/// HTTP operations handler
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
    page_timeout: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler around an already configured client
    pub fn new(client: Client, page_timeout: Duration) -> Self {
        Self {
            client,
            page_timeout,
        }
    }

    /// Fetches the HTML content of a web page within the page time budget
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Timeout` when the budget is exceeded,
    /// `FetchError::ServerError` on a non-2xx status and `FetchError::Http`
    /// for any other transport failure.
    pub async fn get_page(&self, url: &Url) -> FetchResult<String> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| self.classify(url, e))?;
        tracing::debug!("Fetched page {} ({} bytes)", url, text.len());
        Ok(text)
    }

    /// Opens a streaming response for a download
    ///
    /// Only the connect timeout applies here.
    pub async fn get_response(&self, url: &Url) -> DownloadResult<reqwest::Response> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::ServerError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    fn classify(&self, url: &Url, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                seconds: self.page_timeout.as_secs(),
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                source: error,
            }
        }
    }
}
