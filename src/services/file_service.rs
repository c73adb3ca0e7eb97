//! FileService — upload and download orchestration.
//!
//! Sequences extension classification, key generation and backend I/O for
//! one transfer. Holds no per-request state: the backend handle and the
//! extension policy are shared, read-only, and injected at construction.

use crate::{
    models::{
        extension::ExtensionPolicy,
        object::StoredObject,
        object_key::{ObjectKey, extension_of},
    },
    services::backend::{BackendError, ObjectBackend},
};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid file type `{extension}`. Allowed types: {allowed}")]
    UnsupportedMediaType { extension: String, allowed: String },
    #[error("file `{key}` not found")]
    ObjectNotFound { key: String },
    #[error("storage failure: {0}")]
    StorageFailure(#[source] BackendError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Clone)]
pub struct FileService {
    backend: Arc<dyn ObjectBackend>,
    policy: Arc<ExtensionPolicy>,
}

impl FileService {
    pub fn new(backend: Arc<dyn ObjectBackend>, policy: Arc<ExtensionPolicy>) -> Self {
        Self { backend, policy }
    }

    /// Store `payload` under a freshly minted key derived from `filename`'s
    /// extension.
    ///
    /// The backend is never called for a disallowed extension. A key is only
    /// returned once the backend has accepted the bytes; a failed write leaves
    /// nothing behind to clean up.
    pub async fn upload(&self, filename: &str, payload: Bytes) -> GatewayResult<ObjectKey> {
        let extension = extension_of(filename);
        let class = self.policy.classify(&extension);
        if !class.allowed {
            warn!(filename, extension = %extension, "rejecting upload with unsupported extension");
            return Err(GatewayError::UnsupportedMediaType {
                extension,
                allowed: self.policy.allowed_extensions().join(", "),
            });
        }

        let key = ObjectKey::generate(&extension);
        let size = payload.len();
        self.backend
            .put(&key, payload, &class.content_type)
            .await
            .map_err(|err| {
                error!(key = %key, "failed to save file to storage: {}", err);
                GatewayError::StorageFailure(err)
            })?;

        info!(key = %key, size, content_type = %class.content_type, "uploaded file");
        Ok(key)
    }

    /// Fetch the payload stored under `key`.
    ///
    /// The extension only picks the content type; unknown extensions are
    /// served as `application/octet-stream` rather than refused.
    pub async fn download(&self, key: ObjectKey) -> GatewayResult<StoredObject> {
        let class = self.policy.classify(&key.extension());

        let fetched = self.backend.get(&key).await.map_err(|err| match err {
            BackendError::NotFound { key } => {
                warn!(key = %key, "file not found in storage");
                GatewayError::ObjectNotFound { key }
            }
            other => {
                error!(key = %key, "download error: {}", other);
                GatewayError::StorageFailure(other)
            }
        })?;

        if let Some(hint) = fetched.content_type_hint.as_deref() {
            if hint != class.content_type {
                debug!(key = %key, hint, resolved = %class.content_type, "backend content type differs from extension");
            }
        }

        info!(key = %key, size = fetched.payload.len(), "retrieved file");
        Ok(StoredObject {
            key,
            payload: fetched.payload,
            content_type: class.content_type,
        })
    }

    /// Readiness check passthrough.
    pub async fn check_backend(&self) -> Result<(), BackendError> {
        self.backend.check().await
    }
}
