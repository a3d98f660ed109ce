use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::capture::Channel;

/// Durable recording configuration. Field names match the JSON the appliance
/// has always written, so an existing config.json keeps working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub rtsp_url1: String,
    pub rtsp_url2: String,
    pub save_path1: PathBuf,
    pub save_path2: PathBuf,
    /// Segment duration in seconds. Must be greater than zero.
    pub segment_time: u32,
    pub dual_stream_enabled: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            rtsp_url1: "rtsp://192.168.1.63:554/media/video1".to_string(),
            rtsp_url2: "rtsp://192.168.1.63:554/media/video2".to_string(),
            save_path1: PathBuf::from("/mnt/tfcard/videos1"),
            save_path2: PathBuf::from("/mnt/tfcard/videos2"),
            segment_time: 600,
            dual_stream_enabled: true,
        }
    }
}

impl RecordingConfig {
    pub fn stream_url(&self, channel: Channel) -> &str {
        match channel {
            Channel::One => &self.rtsp_url1,
            Channel::Two => &self.rtsp_url2,
        }
    }

    pub fn save_path(&self, channel: Channel) -> &Path {
        match channel {
            Channel::One => &self.save_path1,
            Channel::Two => &self.save_path2,
        }
    }
}

/// Partial configuration update. Used both by POST /api/config and as the
/// optional override body of POST /api/start.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    pub rtsp_url1: Option<String>,
    pub rtsp_url2: Option<String>,
    pub save_path1: Option<PathBuf>,
    pub save_path2: Option<PathBuf>,
    pub segment_time: Option<u32>,
    pub dual_stream_enabled: Option<bool>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.rtsp_url1.is_none()
            && self.rtsp_url2.is_none()
            && self.save_path1.is_none()
            && self.save_path2.is_none()
            && self.segment_time.is_none()
            && self.dual_stream_enabled.is_none()
    }
}

/// Holds the recording configuration behind one lock. All mutation goes
/// through `update`, which persists before the new value becomes visible.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<RecordingConfig>,
}

impl ConfigStore {
    /// Load from disk. A missing or malformed file falls back to defaults;
    /// configuration problems are never fatal.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        "malformed recording config {}: {}, using defaults",
                        path.display(),
                        e
                    );
                    RecordingConfig::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no recording config at {}, using defaults", path.display());
                RecordingConfig::default()
            }
            Err(e) => {
                warn!(
                    "failed to read recording config {}: {}, using defaults",
                    path.display(),
                    e
                );
                RecordingConfig::default()
            }
        };

        Self {
            path,
            current: RwLock::new(config),
        }
    }

    pub async fn snapshot(&self) -> RecordingConfig {
        self.current.read().await.clone()
    }

    /// Merge a partial update under the write lock, persist it, and return
    /// the merged configuration.
    pub async fn update(&self, patch: &ConfigPatch) -> Result<RecordingConfig> {
        let mut current = self.current.write().await;

        let mut next = current.clone();
        if let Some(url) = &patch.rtsp_url1 {
            next.rtsp_url1 = url.clone();
        }
        if let Some(url) = &patch.rtsp_url2 {
            next.rtsp_url2 = url.clone();
        }
        if let Some(path) = &patch.save_path1 {
            next.save_path1 = path.clone();
        }
        if let Some(path) = &patch.save_path2 {
            next.save_path2 = path.clone();
        }
        if let Some(secs) = patch.segment_time {
            next.segment_time = secs;
        }
        if let Some(enabled) = patch.dual_stream_enabled {
            next.dual_stream_enabled = enabled;
        }

        if next.segment_time == 0 {
            bail!("segment_time must be greater than zero");
        }

        let raw = serde_json::to_string_pretty(&next)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;

        *current = next.clone();
        Ok(next)
    }
}
