//! Test doubles shared by service and handler tests.

use super::backend::{BackendError, BackendResult, FetchedObject, ObjectBackend, OpendalBackend};
use crate::models::object_key::ObjectKey;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// How a [`RecordingBackend`] should behave.
#[derive(Clone, Copy, Debug)]
pub enum Mode {
    /// Delegate to an in-memory OpenDAL operator.
    Healthy,
    /// Every call fails as if credentials were rejected.
    Unavailable,
    /// Every call fails with a generic backend error.
    Broken,
}

/// In-memory backend that counts calls and can be told to fail.
pub struct RecordingBackend {
    inner: OpendalBackend,
    mode: Mode,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl RecordingBackend {
    pub fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            inner: OpendalBackend::memory().expect("memory operator"),
            mode,
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        })
    }

    pub fn healthy() -> Arc<Self> {
        Self::new(Mode::Healthy)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Seed an object directly, bypassing the call counters.
    pub async fn seed(&self, key: &ObjectKey, payload: &'static [u8]) {
        self.inner
            .put(
                key,
                Bytes::from_static(payload),
                "application/octet-stream",
            )
            .await
            .expect("seed object");
    }

    fn failure(&self) -> Option<BackendError> {
        match self.mode {
            Mode::Healthy => None,
            Mode::Unavailable => Some(BackendError::Unavailable("credentials rejected".into())),
            Mode::Broken => Some(BackendError::Other("internal error".into())),
        }
    }
}

#[async_trait]
impl ObjectBackend for RecordingBackend {
    async fn put(&self, key: &ObjectKey, payload: Bytes, content_type: &str) -> BackendResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        match self.failure() {
            Some(err) => Err(err),
            None => self.inner.put(key, payload, content_type).await,
        }
    }

    async fn get(&self, key: &ObjectKey) -> BackendResult<FetchedObject> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        match self.failure() {
            Some(err) => Err(err),
            None => self.inner.get(key).await,
        }
    }

    async fn check(&self) -> BackendResult<()> {
        match self.failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
