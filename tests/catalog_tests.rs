// Integration tests for the segment catalog
//
// These tests verify active/finalized classification against the freshness
// window and the mtime-descending ordering of listings.

use anyhow::Result;
use camrec::catalog::{self, is_active};
use camrec::RecordingConfig;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const WINDOW: Duration = Duration::from_secs(5);

fn test_config(dir1: &Path, dir2: &Path) -> RecordingConfig {
    RecordingConfig {
        save_path1: dir1.to_path_buf(),
        save_path2: dir2.to_path_buf(),
        ..RecordingConfig::default()
    }
}

fn write_segment(dir: &Path, name: &str, age: Duration) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, b"segment bytes")?;
    let file = OpenOptions::new().write(true).open(&path)?;
    file.set_modified(SystemTime::now() - age)?;
    Ok(())
}

#[test]
fn classification_boundary_sits_at_the_freshness_window() {
    let now = SystemTime::now();
    assert!(is_active(now - Duration::from_secs(2), now, WINDOW));
    assert!(!is_active(now - Duration::from_secs(10), now, WINDOW));
    // exactly at the window counts as finalized
    assert!(!is_active(now - WINDOW, now, WINDOW));
}

#[test]
fn listing_is_ordered_most_recent_first() -> Result<()> {
    let dir1 = TempDir::new()?;
    let dir2 = TempDir::new()?;
    let config = test_config(dir1.path(), dir2.path());

    write_segment(dir1.path(), "oldest.mp4", Duration::from_secs(300))?;
    write_segment(dir2.path(), "middle.mp4", Duration::from_secs(120))?;
    write_segment(dir1.path(), "newest.mp4", Duration::from_secs(30))?;

    let files = catalog::list_segments(&config, WINDOW);
    let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
    assert_eq!(names, vec!["newest.mp4", "middle.mp4", "oldest.mp4"]);

    Ok(())
}

#[test]
fn listing_reports_channel_and_relative_path() -> Result<()> {
    let dir1 = TempDir::new()?;
    let dir2 = TempDir::new()?;
    let config = test_config(dir1.path(), dir2.path());

    write_segment(dir1.path(), "a.mp4", Duration::from_secs(60))?;
    write_segment(dir2.path(), "b.mp4", Duration::from_secs(30))?;

    let files = catalog::list_segments(&config, WINDOW);
    assert_eq!(files.len(), 2);

    let a = files.iter().find(|file| file.name == "a.mp4").unwrap();
    assert_eq!(a.channel, "videos1");
    assert_eq!(a.relative_path, "videos1/a.mp4");
    assert_eq!(a.size, 13);
    assert!(!a.is_recording);

    let b = files.iter().find(|file| file.name == "b.mp4").unwrap();
    assert_eq!(b.channel, "videos2");
    assert_eq!(b.relative_path, "videos2/b.mp4");

    Ok(())
}

#[test]
fn non_segment_files_are_skipped() -> Result<()> {
    let dir1 = TempDir::new()?;
    let dir2 = TempDir::new()?;
    let config = test_config(dir1.path(), dir2.path());

    write_segment(dir1.path(), "keep.mp4", Duration::from_secs(60))?;
    fs::write(dir1.path().join("notes.txt"), b"not a segment")?;
    fs::write(dir1.path().join("partial.mp4.tmp"), b"still muxing")?;

    let files = catalog::list_segments(&config, WINDOW);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "keep.mp4");

    Ok(())
}

#[test]
fn missing_channel_directories_list_as_empty() {
    let config = test_config(
        Path::new("/nonexistent/videos1"),
        Path::new("/nonexistent/videos2"),
    );
    assert!(catalog::list_segments(&config, WINDOW).is_empty());
}

#[test]
fn active_listing_annotates_duration_even_without_a_capture_process() -> Result<()> {
    let dir1 = TempDir::new()?;
    let dir2 = TempDir::new()?;
    let pid_dir = TempDir::new()?;
    let config = test_config(dir1.path(), dir2.path());

    // fresh mtime classifies as active
    write_segment(dir1.path(), "live.mp4", Duration::from_secs(0))?;
    write_segment(dir1.path(), "done.mp4", Duration::from_secs(60))?;

    let active = catalog::list_active_segments(&config, WINDOW, pid_dir.path());
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "live.mp4");
    // no pid record for the channel: duration falls back to zero
    assert_eq!(active[0].recording_duration.as_deref(), Some("00:00:00"));

    Ok(())
}
