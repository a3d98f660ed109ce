//! Segment catalog
//!
//! Enumerates the segment files the external segmenter leaves in the two
//! channel directories, classifies each as actively-written or finalized,
//! and computes elapsed recording time for active entries.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::warn;

use crate::capture::{proctab, Channel, PidRecord, SEGMENT_EXT};
use crate::store::RecordingConfig;

/// One recorded segment as reported by the catalog endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentFile {
    pub name: String,
    pub full_path: String,
    pub relative_path: String,
    pub size: u64,
    pub size_str: String,
    pub modify_time: i64,
    pub time_str: String,
    pub channel: String,
    pub is_recording: bool,
    /// Elapsed capture runtime, only present in active listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_duration: Option<String>,
}

/// A segment modified within the freshness window is still being written:
/// the segmenter touches the open file continuously, finalized files go
/// quiet. A heuristic, not a guarantee.
pub fn is_active(modified: SystemTime, now: SystemTime, window: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age < window,
        // mtime ahead of the clock: treat as being written
        Err(_) => true,
    }
}

/// All segments from both channel directories, most recent first. Entries
/// with equal mtimes keep directory enumeration order.
pub fn list_segments(config: &RecordingConfig, window: Duration) -> Vec<SegmentFile> {
    let now = SystemTime::now();
    let mut files = Vec::new();
    for channel in Channel::ALL {
        scan_dir(config.save_path(channel), channel, now, window, &mut files);
    }
    files.sort_by_key(|file| std::cmp::Reverse(file.modify_time));
    files
}

/// Active subset of `list_segments`, each entry annotated with the elapsed
/// runtime of the channel's recorded capture process (`00:00:00` when no
/// such process exists).
pub fn list_active_segments(
    config: &RecordingConfig,
    window: Duration,
    pid_dir: &Path,
) -> Vec<SegmentFile> {
    let mut active: Vec<SegmentFile> = list_segments(config, window)
        .into_iter()
        .filter(|file| file.is_recording)
        .collect();

    for file in &mut active {
        let duration = Channel::from_label(&file.channel)
            .and_then(|channel| PidRecord::for_channel(pid_dir, channel).read())
            .map(proctab::elapsed_runtime)
            .unwrap_or_else(|| "00:00:00".to_string());
        file.recording_duration = Some(duration);
    }

    active
}

fn scan_dir(
    dir: &Path,
    channel: Channel,
    now: SystemTime,
    window: Duration,
    out: &mut Vec<SegmentFile>,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        // the channel directory may not exist until the first start
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SEGMENT_EXT) {
            continue;
        }
        let name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("failed to stat {}: {}", path.display(), e);
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }

        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let modify_time = modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        out.push(SegmentFile {
            relative_path: format!("{}/{}", channel.label(), name),
            full_path: path.display().to_string(),
            size: meta.len(),
            size_str: format_file_size(meta.len()),
            modify_time,
            time_str: format_mtime(modified),
            channel: channel.label().to_string(),
            is_recording: is_active(modified, now, window),
            recording_duration: None,
            name,
        });
    }
}

/// Human-readable byte count, B through TB, two decimals above bytes.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

fn format_mtime(modified: SystemTime) -> String {
    chrono::DateTime::<chrono::Local>::from(modified)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::format_file_size;

    #[test]
    fn bytes_print_without_decimals() {
        assert_eq!(format_file_size(512), "512 B");
    }

    #[test]
    fn larger_units_get_two_decimals() {
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1536 * 1024), "1.50 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
