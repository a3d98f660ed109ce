//! Media server
//!
//! Serves segment bytes with single-range support and guards deletion: a
//! path must resolve under one of the two channel directories, and a
//! segment the catalog currently classifies as active cannot be deleted.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{info, warn};

use crate::capture::Channel;
use crate::catalog;
use crate::store::RecordingConfig;

/// Outcome of a delete request. Denial is a contract result the client
/// sees, not an error.
#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    Denied(String),
    Failed(String),
}

/// Map a preview path like `videos1/2024-06-01_10-00-00.mp4` onto the
/// configured channel directory. Paths not rooted at a channel label, or
/// containing any non-normal component, resolve to nothing.
pub fn resolve_preview_path(relative: &str, config: &RecordingConfig) -> Option<PathBuf> {
    if Path::new(relative)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let (label, rest) = relative.split_once('/')?;
    if rest.is_empty() {
        return None;
    }
    let channel = Channel::from_label(label)?;
    Some(config.save_path(channel).join(rest))
}

/// True when the path sits under one of the configured channel directories
/// and contains no traversal components.
pub fn path_under_roots(path: &Path, config: &RecordingConfig) -> bool {
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
    {
        return false;
    }
    Channel::ALL
        .iter()
        .any(|&channel| path.starts_with(config.save_path(channel)))
}

/// Clamp a single `bytes=start-end` header against the file size, returning
/// the inclusive span to serve. Out-of-range and inverted bounds are
/// clamped, not rejected. None for anything unparseable, multi-range specs,
/// or empty files; the caller then serves the whole file.
pub fn parse_range(header: &str, size: u64) -> Option<(u64, u64)> {
    if size == 0 {
        return None;
    }
    let spec = header.strip_prefix("bytes=")?;
    if spec.contains(',') {
        // a single range only
        return None;
    }
    let (start_raw, end_raw) = spec.split_once('-')?;
    let start: u64 = if start_raw.is_empty() {
        0
    } else {
        start_raw.trim().parse().ok()?
    };
    let end: u64 = if end_raw.is_empty() {
        size - 1
    } else {
        end_raw.trim().parse().ok()?
    };

    let start = start.min(size - 1);
    let end = end.min(size - 1);
    Some((start.min(end), end))
}

/// Read an inclusive byte span from a segment file.
pub async fn read_range(path: &Path, start: u64, end: u64) -> Result<Vec<u8>> {
    let mut file = File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.seek(SeekFrom::Start(start))
        .await
        .with_context(|| format!("failed to seek {}", path.display()))?;

    let mut buf = vec![0u8; (end - start + 1) as usize];
    file.read_exact(&mut buf)
        .await
        .with_context(|| format!("short read from {}", path.display()))?;
    Ok(buf)
}

/// Delete a segment unless it lies outside the managed directories or is
/// still being written. The active check and the unlink are not atomic;
/// best-effort, not a transaction.
pub fn delete_segment(
    path: &str,
    config: &RecordingConfig,
    window: Duration,
    pid_dir: &Path,
) -> DeleteOutcome {
    let target = Path::new(path);
    if !path_under_roots(target, config) {
        return DeleteOutcome::Denied(
            "deleting files outside the recording directories is not allowed".to_string(),
        );
    }

    let active = catalog::list_active_segments(config, window, pid_dir);
    if active.iter().any(|file| Path::new(&file.full_path) == target) {
        return DeleteOutcome::Denied("cannot delete a segment that is still recording".to_string());
    }

    match std::fs::remove_file(target) {
        Ok(()) => {
            info!("deleted segment {}", target.display());
            DeleteOutcome::Deleted
        }
        Err(e) => {
            warn!("failed to delete {}: {}", target.display(), e);
            DeleteOutcome::Failed(format!("failed to delete file: {e}"))
        }
    }
}
