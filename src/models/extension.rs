//! Extension classification: upload allow-list and content-type lookup.

use std::collections::HashMap;

/// Content type served for anything the policy does not recognise.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Outcome of classifying one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Whether uploads with this extension are accepted.
    pub allowed: bool,
    /// MIME type to store and serve the payload with.
    pub content_type: String,
}

/// Immutable mapping from lower-case extension to its content type.
///
/// Every extension present in the table is allowed for upload; anything
/// else is rejected on upload and served as [`FALLBACK_CONTENT_TYPE`] on
/// download. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ExtensionPolicy {
    content_types: HashMap<String, String>,
}

impl ExtensionPolicy {
    pub fn new<I, E, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (E, C)>,
        E: Into<String>,
        C: Into<String>,
    {
        let content_types = entries
            .into_iter()
            .map(|(ext, ct)| (ext.into().to_ascii_lowercase(), ct.into()))
            .collect();
        Self { content_types }
    }

    /// Classify an extension. Lookup is case-insensitive.
    pub fn classify(&self, extension: &str) -> Classification {
        match self.content_types.get(&extension.to_ascii_lowercase()) {
            Some(content_type) => Classification {
                allowed: true,
                content_type: content_type.clone(),
            },
            None => Classification {
                allowed: false,
                content_type: FALLBACK_CONTENT_TYPE.to_string(),
            },
        }
    }

    /// Allowed extensions, sorted, for error messages.
    pub fn allowed_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.content_types.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for ExtensionPolicy {
    /// Documents and common web images.
    fn default() -> Self {
        Self::new([
            ("pdf", "application/pdf"),
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("png", "image/png"),
            ("gif", "image/gif"),
        ])
    }
}
