use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router: the /api surface plus the static web UI fallback
pub fn create_router(state: AppState) -> Router {
    let web_root = state.settings.web_root.clone();

    Router::new()
        // Recording control and status
        .route("/api/status", get(handlers::status))
        .route("/api/start", post(handlers::start_recording))
        .route("/api/stop", post(handlers::stop_recording))
        .route(
            "/api/config",
            get(handlers::get_config).post(handlers::update_config),
        )
        // Segment catalog and playback
        .route("/api/files", get(handlers::list_files))
        .route("/api/recording-files", get(handlers::recording_files))
        .route("/api/delete-file", post(handlers::delete_file))
        .route("/api/preview/*path", get(handlers::preview))
        .route("/api/upload-to-s3", post(handlers::upload_to_s3))
        // System health
        .route("/api/system-monitor", get(handlers::system_monitor))
        // Static web UI
        .fallback_service(ServeDir::new(web_root))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
