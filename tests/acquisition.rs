//! Integration tests for change-aware acquisition
//!
//! These tests drive the downloader through its public API against a fake
//! remote source and check what it leaves on disk.

mod common;

use osm_router::app::{AcquisitionOutcome, ChangeCache, PipelineLayout, ProtobufDownloader};
use osm_router::errors::AppError;
use tempfile::TempDir;

use common::{page_url, FakeSource};

fn downloader(source: FakeSource, dir: &TempDir) -> ProtobufDownloader<FakeSource> {
    let layout = PipelineLayout::new(dir.path().join("data"), "brazil");
    ProtobufDownloader::new(source, page_url(), "brazil", layout.download()).unwrap()
}

#[tokio::test]
async fn test_extract_lands_in_external_layout() {
    let temp_dir = TempDir::new().unwrap();
    let source = FakeSource::with_marker("2024-05-01T20:21:02Z");

    let acquisition = downloader(source.clone(), &temp_dir).run().await.unwrap();

    let expected = temp_dir
        .path()
        .join("data/external/pbf/brazil-latest.osm.pbf");
    assert_eq!(acquisition.artifact.path, expected);
    assert!(expected.is_file());

    let sidecar = temp_dir
        .path()
        .join("data/external/pbf/brazil-latest.osm.pbf.json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sidecar).unwrap()).unwrap();
    assert_eq!(json["marker"], "2024-05-01T20:21:02Z");
    assert_eq!(json["country_code"], "brazil");
    assert!(json["recorded_at"].is_string());

    assert_eq!(
        source.0.lock().unwrap().downloads[0].as_str(),
        "https://download.geofabrik.de/south-america/brazil-latest.osm.pbf"
    );
}

#[tokio::test]
async fn test_marker_only_sidecar_suppresses_download() {
    let temp_dir = TempDir::new().unwrap();
    let layout = PipelineLayout::new(temp_dir.path().join("data"), "brazil");
    let artifact = layout.download();
    std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    std::fs::write(&artifact, b"PBF").unwrap();
    std::fs::write(
        ChangeCache::for_artifact(&artifact).sidecar_path(),
        r#"{ "marker": "2024-05-01T20:21:02Z" }"#,
    )
    .unwrap();

    let source = FakeSource::with_marker("2024-05-01T20:21:02Z");
    let acquisition = downloader(source.clone(), &temp_dir).run().await.unwrap();

    assert_eq!(acquisition.outcome, AcquisitionOutcome::Unchanged);
    assert_eq!(source.download_count(), 0);
}

#[tokio::test]
async fn test_server_error_surfaces_and_leaves_no_record() {
    let temp_dir = TempDir::new().unwrap();
    let source = FakeSource::with_marker("2024-05-01T20:21:02Z");
    source.0.lock().unwrap().fail_downloads = true;
    let downloader = downloader(source.clone(), &temp_dir);

    let result = downloader.run().await;

    assert!(matches!(result, Err(AppError::Download(_))));
    assert!(!ChangeCache::for_artifact(downloader.target_path())
        .sidecar_path()
        .exists());
}

#[tokio::test]
async fn test_page_without_country_link_fails() {
    let temp_dir = TempDir::new().unwrap();
    let source = FakeSource::with_marker("2024-05-01T20:21:02Z");
    let layout = PipelineLayout::new(temp_dir.path().join("data"), "chile");
    let downloader =
        ProtobufDownloader::new(source.clone(), page_url(), "chile", layout.download()).unwrap();

    let result = downloader.run().await;

    assert!(matches!(result, Err(AppError::Extract(_))));
    assert_eq!(source.download_count(), 0);
}
