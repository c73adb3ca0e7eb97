//! Object keys: the only index into the backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for a stored payload, formatted `<uuid-v4>.<extension>`.
///
/// Keys are minted once at upload time and never change afterwards. There is
/// no side record: whatever the backend holds under a key *is* the object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Mint a fresh key for an already-validated extension.
    ///
    /// The extension is taken as given; callers classify it first.
    pub fn generate(extension: &str) -> Self {
        Self(format!("{}.{}", Uuid::new_v4(), extension))
    }

    /// Accept a key received from a client (download path).
    ///
    /// Only the shape [`ObjectKey::generate`] produces is accepted: a UUID
    /// stem, exactly one `.`, and no path separators. Anything else cannot
    /// name a stored object and must never reach the backend as a path.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.contains(['/', '\\']) || raw.contains("..") {
            return None;
        }
        let (stem, extension) = raw.split_once('.')?;
        if extension.contains('.') || Uuid::try_parse(stem).is_err() {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased text after the last `.`, or the whole key when it has none.
    pub fn extension(&self) -> String {
        extension_of(&self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract the extension of a filename: everything after the last `.`,
/// lower-cased. A name without a dot is returned whole (lower-cased).
pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_key_is_uuid_dot_extension() {
        let key = ObjectKey::generate("pdf");
        let (id, ext) = key.as_str().split_once('.').expect("key has a dot");
        assert_eq!(ext, "pdf");
        let parsed = Uuid::parse_str(id).expect("uuid prefix");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn generated_keys_do_not_repeat() {
        let keys: HashSet<_> = (0..1000).map(|_| ObjectKey::generate("png")).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn extension_is_text_after_last_dot() {
        assert_eq!(extension_of("report.pdf"), "pdf");
        assert_eq!(extension_of("archive.tar.GZ"), "gz");
        assert_eq!(extension_of("Photo.JPEG"), "jpeg");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn name_without_dot_is_its_own_extension() {
        assert_eq!(extension_of("README"), "readme");
    }

    #[test]
    fn parse_accepts_generated_keys_with_any_extension() {
        let key = ObjectKey::generate("pdf");
        assert_eq!(ObjectKey::parse(key.as_str()), Some(key));

        let legacy = ObjectKey::parse("5b0c7a4e-8f1d-4c2a-9e3b-1a2b3c4d5e6f.BIN").unwrap();
        assert_eq!(legacy.extension(), "bin");
    }

    #[test]
    fn parse_rejects_paths_and_foreign_shapes() {
        let id = "5b0c7a4e-8f1d-4c2a-9e3b-1a2b3c4d5e6f";
        for raw in [
            "../secret.txt".to_string(),
            "..".to_string(),
            format!("{id}.pdf/../../etc"),
            format!("sub/{id}.pdf"),
            format!("{id}.pd\\f"),
            format!("{id}.tar.gz"),
            format!("{id}..pdf"),
            id.to_string(),
            "report.pdf".to_string(),
            String::new(),
        ] {
            assert_eq!(ObjectKey::parse(&raw), None, "{raw:?} should be rejected");
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let key = ObjectKey::generate("png");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key));
    }
}
