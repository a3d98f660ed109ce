use super::state::AppState;
use crate::capture::Channel;
use crate::catalog::{self, SegmentFile};
use crate::media::{self, DeleteOutcome};
use crate::storage::{self, StorageStatus};
use crate::store::ConfigPatch;
use crate::telemetry;
use crate::upload;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Uniform `{success, message}` body for control operations.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }

    fn fail(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub recording1: bool,
    pub recording2: bool,
    pub tfcard: StorageStatus,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub success: bool,
    pub files: Vec<SegmentFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileRequest {
    pub file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub file_path: String,
    pub file_name: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/status
/// Per-channel liveness re-derived from pid records, plus storage usage.
/// Never cached: the UI polls this to drive the record button.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let response = StatusResponse {
        recording1: state.supervisor.channel_recording(Channel::One),
        recording2: state.supervisor.channel_recording(Channel::Two),
        tfcard: storage::storage_status(Path::new(&state.settings.storage.mount_path)),
    };
    (no_cache_headers(), Json(response))
}

/// POST /api/start
/// Start capture on every enabled channel; the body may carry a partial
/// configuration override.
pub async fn start_recording(
    State(state): State<AppState>,
    body: Option<Json<ConfigPatch>>,
) -> impl IntoResponse {
    let patch = body.map(|Json(patch)| patch).unwrap_or_default();
    match state.supervisor.start(&patch).await {
        Ok(()) => ApiMessage::ok("recording started"),
        Err(e) => {
            error!("failed to start recording: {:#}", e);
            ApiMessage::fail(format!("failed to start recording: {e:#}"))
        }
    }
}

/// POST /api/stop
/// Stop all capture sessions.
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.supervisor.stop().await {
        Ok(()) => ApiMessage::ok("recording stopped"),
        Err(e) => {
            error!("failed to stop recording: {:#}", e);
            ApiMessage::fail(format!("failed to stop recording: {e:#}"))
        }
    }
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot().await)
}

/// POST /api/config
/// Merge-write the recording configuration.
pub async fn update_config(
    State(state): State<AppState>,
    Json(patch): Json<ConfigPatch>,
) -> impl IntoResponse {
    match state.store.update(&patch).await {
        Ok(_) => ApiMessage::ok("configuration updated"),
        Err(e) => ApiMessage::fail(format!("failed to update configuration: {e:#}")),
    }
}

/// GET /api/files
/// Full segment catalog, finalized and active.
pub async fn list_files(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.store.snapshot().await;
    let files = catalog::list_segments(&config, state.freshness_window());
    Json(FileListResponse {
        success: true,
        files,
    })
}

/// GET /api/recording-files
/// Actively-written subset with elapsed recording duration.
pub async fn recording_files(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.store.snapshot().await;
    let files = catalog::list_active_segments(
        &config,
        state.freshness_window(),
        state.supervisor.pid_dir(),
    );
    Json(FileListResponse {
        success: true,
        files,
    })
}

/// POST /api/delete-file
pub async fn delete_file(
    State(state): State<AppState>,
    Json(request): Json<DeleteFileRequest>,
) -> impl IntoResponse {
    let config = state.store.snapshot().await;
    match media::delete_segment(
        &request.file_path,
        &config,
        state.freshness_window(),
        state.supervisor.pid_dir(),
    ) {
        DeleteOutcome::Deleted => ApiMessage::ok("file deleted"),
        DeleteOutcome::Denied(message) => ApiMessage::fail(message),
        DeleteOutcome::Failed(message) => ApiMessage::fail(message),
    }
}

/// GET /api/preview/*path
/// Byte-range capable segment delivery; `?download` forces an attachment
/// disposition for the browser.
pub async fn preview(
    State(state): State<AppState>,
    UrlPath(relative): UrlPath<String>,
    Query(query): Query<HashMap<String, String>>,
    request_headers: HeaderMap,
) -> Response {
    let config = state.store.snapshot().await;
    let Some(path) = media::resolve_preview_path(&relative, &config) else {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    };
    let size = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return (StatusCode::NOT_FOUND, "File not found").into_response(),
    };

    let range = request_headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| media::parse_range(value, size));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    if let Some((start, end)) = range {
        let bytes = match media::read_range(&path, start, end).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("preview failed for {}: {:#}", path.display(), e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Preview failed").into_response();
            }
        };
        if let Ok(value) = HeaderValue::from_str(&format!("bytes {start}-{end}/{size}")) {
            headers.insert(header::CONTENT_RANGE, value);
        }
        return (StatusCode::PARTIAL_CONTENT, headers, bytes).into_response();
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("preview failed for {}: {:#}", path.display(), e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Preview failed").into_response();
        }
    };

    if query.contains_key("download") {
        let file_name = relative.rsplit('/').next().unwrap_or(&relative);
        if let Ok(value) =
            HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    (StatusCode::OK, headers, bytes).into_response()
}

/// POST /api/upload-to-s3
/// Delegates to the external upload helper and relays its verdict.
pub async fn upload_to_s3(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Response {
    if tokio::fs::metadata(&request.file_path).await.is_err() {
        return (
            StatusCode::NOT_FOUND,
            ApiMessage::fail(format!("file not found: {}", request.file_path)),
        )
            .into_response();
    }

    match upload::upload_to_s3(
        Path::new(&state.settings.upload.helper),
        &request.file_path,
        &request.file_name,
    )
    .await
    {
        Ok(outcome) if outcome.success => ApiMessage::ok(outcome.message).into_response(),
        Ok(outcome) => ApiMessage::fail(format!("upload failed: {}", outcome.message)).into_response(),
        Err(e) => {
            error!("upload helper error: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiMessage::fail(format!("upload failed: {e:#}")),
            )
                .into_response()
        }
    }
}

/// GET /api/system-monitor
pub async fn system_monitor(State(state): State<AppState>) -> impl IntoResponse {
    Json(telemetry::sample(Path::new(&state.settings.storage.mount_path)).await)
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers
}
