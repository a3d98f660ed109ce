//! HTTP control/status/playback surface
//!
//! This module provides the REST API the web UI talks to:
//! - GET /api/status - per-channel recording state + storage usage
//! - POST /api/start, /api/stop - capture control
//! - GET/POST /api/config - recording configuration
//! - GET /api/files, /api/recording-files - segment catalog
//! - POST /api/delete-file - guarded segment deletion
//! - GET /api/preview/*path - byte-range segment delivery
//! - POST /api/upload-to-s3 - delegate to the external upload helper
//! - GET /api/system-monitor - system health snapshot

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
