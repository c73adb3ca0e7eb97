//! Defines routes for the gateway.
//!
//! ## Structure
//! - **File endpoints** (nested under `/files`)
//!   - `POST /files/upload` — multipart upload, returns the generated key
//!   - `GET  /files/download/{filename}` — stream a stored object back
//!
//! - **Mail endpoint**
//!   - `POST /send-email` — relay a plain-text message
//!
//! - **Health checks**
//!   - `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        file_handlers::{download_file, upload_file},
        health_handlers::{healthz, readyz},
        mail_handlers::send_email,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the application router.
///
/// `max_upload_bytes` bounds every request body, multipart uploads included.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    let files = Router::new()
        .route("/upload", post(upload_file))
        .route("/download/{filename}", get(download_file));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/send-email", post(send_email))
        .nest("/files", files)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
