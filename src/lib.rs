pub mod capture;
pub mod catalog;
pub mod config;
pub mod http;
pub mod media;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod upload;

pub use capture::{CaptureSupervisor, Channel, PidRecord};
pub use config::Settings;
pub use http::{create_router, AppState};
pub use store::{ConfigPatch, ConfigStore, RecordingConfig};
