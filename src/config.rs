use anyhow::Result;
use serde::Deserialize;

/// Service settings, loaded once at startup. Everything here has a default
/// matching the appliance image, so a missing settings file is not an error.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: HttpSettings,
    pub storage: StorageSettings,
    pub capture: CaptureSettings,
    pub catalog: CatalogSettings,
    pub upload: UploadSettings,
    /// Path of the persisted recording configuration (JSON).
    pub recording_config: String,
    /// Directory of static web UI assets served as the router fallback.
    pub web_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Removable storage mount point the recorder writes to.
    pub mount_path: String,
    /// How long startup waits for the mount point to appear.
    pub mount_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureSettings {
    /// External segmenter binary.
    pub program: String,
    /// Directory holding per-channel pid records.
    pub pid_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    /// A segment modified within this window counts as still being written.
    pub freshness_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// External S3 upload helper script.
    pub helper: String,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("http.bind", "0.0.0.0")?
            .set_default("http.port", 8060)?
            .set_default("storage.mount_path", "/mnt/tfcard")?
            .set_default("storage.mount_timeout_secs", 45)?
            .set_default("capture.program", "ffmpeg")?
            .set_default("capture.pid_dir", "/tmp")?
            .set_default("catalog.freshness_secs", 5)?
            .set_default("upload.helper", "/usr/local/share/camrec/upload_to_s3.py")?
            .set_default("recording_config", "config.json")?
            .set_default("web_root", "web")?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
