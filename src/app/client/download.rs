//! File download operations with atomic writes and streaming
//!
//! Bytes are streamed into `<destination>.part` and renamed into place only
//! after the transfer completes, so an interrupted download never leaves a
//! file at the destination path that a later existence check could trust.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::constants::paths;
use crate::errors::{DownloadError, DownloadResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    show_progress: bool,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler, show_progress: bool) -> Self {
        Self {
            http_handler,
            show_progress,
        }
    }

    /// Downloads a file to the specified path, replacing any existing file
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails, the server answers with
    /// an error status, the body ends before the announced length or any file
    /// operation fails. The partial file is removed in every failure case.
    pub async fn download_file(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(destination);

        match self.download_file_attempt(url, &temp_path).await {
            Ok(received) => {
                tokio::fs::rename(&temp_path, destination)
                    .await
                    .map_err(|source| DownloadError::AtomicOperationFailed {
                        temp_path: temp_path.clone(),
                        final_path: destination.to_path_buf(),
                        source,
                    })?;
                tracing::info!(
                    "Downloaded {} bytes to {}",
                    received,
                    destination.display()
                );
                Ok(received)
            }
            Err(e) => {
                if temp_path.exists() {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                tracing::error!("Download of {} failed: {}", url, e);
                Err(e)
            }
        }
    }

    /// Streams the response body into a temporary path
    async fn download_file_attempt(&self, url: &Url, temp_path: &Path) -> DownloadResult<u64> {
        let mut response = self.http_handler.get_response(url).await?;
        let expected = response.content_length();

        let progress = self.progress_bar(expected);
        let mut file = File::create(temp_path).await?;
        let mut received: u64 = 0;

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                // Connection dropped before the announced length arrived
                Err(e) => match expected {
                    Some(expected) if received < expected => {
                        progress.abandon();
                        tracing::warn!("Body ended after {} of {} bytes: {}", received, expected, e);
                        return Err(DownloadError::IncompleteDownload { received, expected });
                    }
                    _ => return Err(e.into()),
                },
            };
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
            progress.set_position(received);
        }
        file.flush().await?;
        progress.finish_and_clear();

        if let Some(expected) = expected {
            if received != expected {
                return Err(DownloadError::IncompleteDownload { received, expected });
            }
        }

        Ok(received)
    }

    fn progress_bar(&self, length: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match length {
            Some(length) => {
                let bar = ProgressBar::new(length);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
                );
                bar
            }
            None => ProgressBar::new_spinner(),
        }
    }
}

/// Temporary path used while a download is in flight
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".");
    name.push(paths::TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}
