use crate::services::{file_service::FileService, mail_service::Mailer};
use std::sync::Arc;

/// Shared handler state. Built once in `main`; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub files: FileService,
    pub mailer: Arc<dyn Mailer>,
}
