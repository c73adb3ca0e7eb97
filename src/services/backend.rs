//! Storage backend adapter.
//!
//! The only place in the gateway that performs network I/O. Every failure
//! coming out of the object store is folded into [`BackendError`] so nothing
//! upstream ever sees an OpenDAL type.

use crate::{config::StorageConfig, models::object_key::ObjectKey};
use async_trait::async_trait;
use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no object stored under `{key}`")]
    NotFound { key: String },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage backend error: {0}")]
    Other(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Bytes read back from the backend along with whatever content type it
/// recorded at write time.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub payload: Bytes,
    pub content_type_hint: Option<String>,
}

/// Put/get of whole payloads by key.
///
/// Implementations must be safe to share across concurrent requests; the
/// gateway holds exactly one instance for the life of the process.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    async fn put(&self, key: &ObjectKey, payload: Bytes, content_type: &str) -> BackendResult<()>;

    async fn get(&self, key: &ObjectKey) -> BackendResult<FetchedObject>;

    /// Cheap connectivity/credential check used by readiness.
    ///
    /// For S3 this lists the bucket root, so the configured credential needs
    /// list permission on the bucket for readiness to pass.
    async fn check(&self) -> BackendResult<()>;
}

/// [`ObjectBackend`] over an OpenDAL operator (S3 in production, local
/// filesystem for development, memory in tests).
#[derive(Clone)]
pub struct OpendalBackend {
    operator: Operator,
}

impl OpendalBackend {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Build the operator described by the storage configuration.
    pub fn from_config(config: &StorageConfig) -> BackendResult<Self> {
        let operator = match config {
            StorageConfig::S3 {
                endpoint,
                region,
                bucket,
                access_key_id,
                secret_access_key,
            } => {
                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .region(region)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                Operator::new(builder).map_err(config_error)?.finish()
            }
            StorageConfig::Fs { root } => {
                let builder = services::Fs::default().root(root);
                Operator::new(builder).map_err(config_error)?.finish()
            }
        };
        Ok(Self::new(operator))
    }

    /// In-process backend; nothing leaves memory.
    #[cfg(test)]
    pub fn memory() -> BackendResult<Self> {
        let operator = Operator::new(services::Memory::default())
            .map_err(config_error)?
            .finish();
        Ok(Self::new(operator))
    }
}

#[async_trait]
impl ObjectBackend for OpendalBackend {
    async fn put(&self, key: &ObjectKey, payload: Bytes, content_type: &str) -> BackendResult<()> {
        debug!(key = %key, size = payload.len(), content_type, "writing object");
        self.operator
            .write_with(key.as_str(), payload)
            .content_type(content_type)
            .await
            .map_err(|err| normalize(key.as_str(), err))?;
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> BackendResult<FetchedObject> {
        // `read` carries no metadata; the stat is what yields the stored
        // content-type hint.
        let meta = self
            .operator
            .stat(key.as_str())
            .await
            .map_err(|err| normalize(key.as_str(), err))?;
        let buffer = self
            .operator
            .read(key.as_str())
            .await
            .map_err(|err| normalize(key.as_str(), err))?;

        Ok(FetchedObject {
            payload: buffer.to_bytes(),
            content_type_hint: meta.content_type().map(str::to_string),
        })
    }

    async fn check(&self) -> BackendResult<()> {
        self.operator
            .check()
            .await
            .map_err(|err| normalize("/", err))
    }
}

fn config_error(err: opendal::Error) -> BackendError {
    BackendError::Unavailable(format!("invalid storage configuration: {}", err))
}

/// Fold an OpenDAL error into the three backend kinds.
///
/// Credential and connectivity problems (including anything OpenDAL marks as
/// temporary) are `Unavailable`; a missing key is `NotFound`.
fn normalize(key: &str, err: opendal::Error) -> BackendError {
    match err.kind() {
        ErrorKind::NotFound => BackendError::NotFound {
            key: key.to_string(),
        },
        ErrorKind::PermissionDenied | ErrorKind::ConfigInvalid => {
            BackendError::Unavailable(err.to_string())
        }
        _ if err.is_temporary() => BackendError::Unavailable(err.to_string()),
        _ => BackendError::Other(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_same_bytes() {
        let backend = OpendalBackend::memory().unwrap();
        let k = ObjectKey::generate("png");
        backend
            .put(&k, Bytes::from_static(b"\x89PNG..."), "image/png")
            .await
            .unwrap();

        let fetched = backend.get(&k).await.unwrap();
        assert_eq!(fetched.payload, Bytes::from_static(b"\x89PNG..."));
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let backend = OpendalBackend::memory().unwrap();
        let k = ObjectKey::generate("pdf");
        let err = backend.get(&k).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound { key } if key == k.as_str()));
    }

    #[tokio::test]
    async fn second_put_to_other_key_leaves_first_intact() {
        let backend = OpendalBackend::memory().unwrap();
        let (one, two) = (ObjectKey::generate("gif"), ObjectKey::generate("gif"));
        backend
            .put(&one, Bytes::from_static(b"first"), "image/gif")
            .await
            .unwrap();
        backend
            .put(&two, Bytes::from_static(b"second"), "image/gif")
            .await
            .unwrap();

        assert_eq!(backend.get(&one).await.unwrap().payload, "first");
        assert_eq!(backend.get(&two).await.unwrap().payload, "second");
    }

    #[test]
    fn credential_failures_are_unavailable() {
        let err = opendal::Error::new(ErrorKind::PermissionDenied, "InvalidAccessKeyId");
        assert!(matches!(
            normalize("x.pdf", err),
            BackendError::Unavailable(_)
        ));

        let err = opendal::Error::new(ErrorKind::ConfigInvalid, "region is empty");
        assert!(matches!(
            normalize("x.pdf", err),
            BackendError::Unavailable(_)
        ));
    }

    #[test]
    fn temporary_failures_are_unavailable() {
        let err = opendal::Error::new(ErrorKind::Unexpected, "connection reset").set_temporary();
        assert!(matches!(
            normalize("x.pdf", err),
            BackendError::Unavailable(_)
        ));
    }

    #[test]
    fn other_failures_are_backend_errors() {
        let err = opendal::Error::new(ErrorKind::Unexpected, "InternalError");
        assert!(matches!(
            normalize("x.pdf", err),
            BackendError::Other(_)
        ));

        let err = opendal::Error::new(ErrorKind::NotFound, "NoSuchKey");
        assert!(matches!(
            normalize("x.pdf", err),
            BackendError::NotFound { .. }
        ));
    }
}
