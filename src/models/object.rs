//! Transfer-time views of a stored object.

use super::object_key::ObjectKey;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A payload fetched from the backend, ready to be sent to the client.
///
/// Lives only for the duration of one request; nothing is cached.
#[derive(Clone, Debug)]
pub struct StoredObject {
    /// Key the payload was stored under.
    pub key: ObjectKey,

    /// Raw payload bytes.
    pub payload: Bytes,

    /// Content type resolved from the key's extension.
    pub content_type: String,
}

/// JSON body returned by a successful upload.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,

    /// The generated object key.
    pub filename: String,

    /// Relative URL the object can be fetched from.
    pub download_url: String,
}

impl UploadResponse {
    pub fn success(key: &ObjectKey) -> Self {
        Self {
            status: "success".into(),
            message: "File uploaded successfully".into(),
            filename: key.to_string(),
            download_url: format!("/files/download/{}", key),
        }
    }
}
