use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{proctab, Channel};

/// Durable evidence that a channel's capture process was started: a file
/// holding its process id. Written by the monitor task right after spawn,
/// removed on stop. Readers never trust it without probing the process
/// table, so a racing or stale record is harmless.
#[derive(Debug, Clone)]
pub struct PidRecord {
    path: PathBuf,
}

impl PidRecord {
    pub fn for_channel(pid_dir: &Path, channel: Channel) -> Self {
        Self {
            path: pid_dir.join(format!("recording{}.pid", channel.number())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, pid: u32) -> io::Result<()> {
        fs::write(&self.path, pid.to_string())
    }

    /// The recorded pid, or None when the record is absent or unparseable.
    pub fn read(&self) -> Option<u32> {
        let raw = fs::read_to_string(&self.path).ok()?;
        raw.trim().parse().ok()
    }

    /// Remove the record. A missing file is fine, anything else is logged.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("failed to remove pid record {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Re-derive whether a channel is actually recording from its pid record and
/// the process table. An absent record, garbage content, or a dead pid all
/// mean "not recording"; in-memory flags are never consulted.
pub fn channel_alive(pid_dir: &Path, channel: Channel) -> bool {
    PidRecord::for_channel(pid_dir, channel)
        .read()
        .map(proctab::pid_alive)
        .unwrap_or(false)
}
