//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use osm_router::app::RemoteSource;
use osm_router::errors::{DownloadError, DownloadResult, FetchResult};
use url::Url;

pub const PAGE_URL: &str = "https://download.geofabrik.de/south-america/brazil.html";

pub fn page_url() -> Url {
    Url::parse(PAGE_URL).unwrap()
}

/// Index page in the shape Geofabrik publishes
pub fn index_page(marker: &str) -> String {
    format!(
        r#"<html><body>
            <h1>Download OpenStreetMap data for this region: Brazil</h1>
            <ul>
              <li><a href="brazil-latest.osm.pbf">brazil-latest.osm.pbf</a>,
                  suitable for Osmium, Osmosis, imposm, osm2pgsql, mkgmap, and others.
                  This file was last modified {marker} and contains all OSM data up to {marker}.</li>
              <li><a href="brazil-latest.shp.zip">brazil-latest.shp.zip</a></li>
            </ul>
        </body></html>"#
    )
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub page: String,
    pub fail_downloads: bool,
    pub downloads: Vec<Url>,
}

/// Remote source serving a fixed page and writing a stub extract
#[derive(Debug, Clone, Default)]
pub struct FakeSource(pub Arc<Mutex<FakeState>>);

impl FakeSource {
    pub fn with_marker(marker: &str) -> Self {
        let source = Self::default();
        source.set_marker(marker);
        source
    }

    pub fn set_marker(&self, marker: &str) {
        self.0.lock().unwrap().page = index_page(marker);
    }

    pub fn download_count(&self) -> usize {
        self.0.lock().unwrap().downloads.len()
    }
}

impl RemoteSource for FakeSource {
    async fn fetch_page(&self, _url: &Url) -> FetchResult<String> {
        Ok(self.0.lock().unwrap().page.clone())
    }

    async fn download(&self, url: &Url, destination: &Path) -> DownloadResult<u64> {
        let fail = {
            let mut state = self.0.lock().unwrap();
            state.downloads.push(url.clone());
            state.fail_downloads
        };
        if fail {
            return Err(DownloadError::ServerError {
                url: url.to_string(),
                status: 503,
            });
        }
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, b"PBF")?;
        Ok(3)
    }
}

/// Writes an executable shell script
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}
