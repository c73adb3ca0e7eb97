//! HTTP handlers for file upload and download.
//! Transport concerns only; classification and storage live in `FileService`.

use crate::{
    errors::AppError,
    models::{
        object::{StoredObject, UploadResponse},
        object_key::ObjectKey,
    },
    services::file_service::GatewayError,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use std::io::Cursor;
use tokio_util::io::ReaderStream;

/// `POST /files/upload`
///
/// Takes the first multipart part that carries a filename as the file.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let payload = field.bytes().await?;
        let key = state.files.upload(&filename, payload).await?;
        return Ok(Json(UploadResponse::success(&key)));
    }

    Err(AppError::bad_request("request must include a file part"))
}

/// `GET /files/download/{filename}` as a streaming attachment.
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    // Only generated keys can name an object; nothing else is a valid path.
    let key = ObjectKey::parse(&filename).ok_or_else(|| {
        tracing::warn!(filename = %filename, "rejecting malformed object key");
        GatewayError::ObjectNotFound { key: filename.clone() }
    })?;
    let object = state.files.download(key).await?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    set_attachment_headers(response.headers_mut(), &object);

    let stream = ReaderStream::new(Cursor::new(object.payload));
    *response.body_mut() = Body::from_stream(stream);
    Ok(response)
}

fn set_attachment_headers(headers: &mut HeaderMap, object: &StoredObject) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&object.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(object.payload.len()),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename={}", object.key))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
}
