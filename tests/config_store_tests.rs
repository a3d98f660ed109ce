// Integration tests for the recording configuration store: default fallback
// on malformed content, merge semantics, persistence, and validation.

use anyhow::Result;
use camrec::{ConfigPatch, ConfigStore, RecordingConfig};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn missing_file_loads_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let store = ConfigStore::load(dir.path().join("config.json"));
    assert_eq!(store.snapshot().await, RecordingConfig::default());
    Ok(())
}

#[tokio::test]
async fn malformed_file_falls_back_to_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.json");
    fs::write(&path, "{ this is not json")?;

    let store = ConfigStore::load(&path);
    assert_eq!(store.snapshot().await, RecordingConfig::default());
    Ok(())
}

#[tokio::test]
async fn partial_file_fills_missing_fields_with_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"segment_time": 120}"#)?;

    let store = ConfigStore::load(&path);
    let config = store.snapshot().await;
    assert_eq!(config.segment_time, 120);
    assert_eq!(config.rtsp_url1, RecordingConfig::default().rtsp_url1);
    Ok(())
}

#[tokio::test]
async fn update_merges_and_persists() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.json");
    let store = ConfigStore::load(&path);

    let merged = store
        .update(&ConfigPatch {
            rtsp_url1: Some("rtsp://camera.local/stream1".to_string()),
            segment_time: Some(300),
            ..ConfigPatch::default()
        })
        .await?;

    assert_eq!(merged.rtsp_url1, "rtsp://camera.local/stream1");
    assert_eq!(merged.segment_time, 300);
    // untouched fields keep their values
    assert_eq!(merged.rtsp_url2, RecordingConfig::default().rtsp_url2);

    // a fresh store sees the persisted values
    let reloaded = ConfigStore::load(&path);
    assert_eq!(reloaded.snapshot().await, merged);
    Ok(())
}

#[tokio::test]
async fn zero_segment_time_is_rejected_and_nothing_changes() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.json");
    let store = ConfigStore::load(&path);
    let before = store.snapshot().await;

    let result = store
        .update(&ConfigPatch {
            segment_time: Some(0),
            ..ConfigPatch::default()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(store.snapshot().await, before);
    assert!(!path.exists(), "rejected update must not be persisted");
    Ok(())
}

#[test]
fn empty_patch_reports_empty() {
    assert!(ConfigPatch::default().is_empty());
    let patch = ConfigPatch {
        dual_stream_enabled: Some(true),
        ..ConfigPatch::default()
    };
    assert!(!patch.is_empty());
}
