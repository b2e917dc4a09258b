//! Temporary storage for uploaded recordings
//!
//! An upload lives on disk only while features are extracted from it.
//! [`TempUpload`] removes the file when [`TempUpload::remove`] is called and,
//! as a fallback, when the guard is dropped on any other exit path.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// Name used when sanitizing leaves nothing usable
const FALLBACK_NAME: &str = "upload";

/// An uploaded file persisted to the upload directory
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    removed: bool,
}

impl TempUpload {
    /// Write `bytes` to a uniquely named file in `dir`
    ///
    /// The stored name is `<uuid>-<sanitized original name>`, keeping the
    /// extension as a format hint for the decoder.
    pub async fn persist(dir: &Path, original_name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name));
        let upload = Self {
            path: dir.join(file_name),
            removed: false,
        };

        // On failure `upload` is dropped here and any partial file removed
        tokio::fs::write(&upload.path, bytes).await?;
        debug!(path = %upload.path.display(), bytes = bytes.len(), "Upload stored");

        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now
    ///
    /// Blocking; call it from the worker that read the file. Failures are logged; the request outcome does not depend on cleanup.
    pub fn remove(mut self) {
        self.removed = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove upload: {}", e),
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Upload removed on drop"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove upload: {}", e),
        }
    }
}

/// Reduce a client-supplied file name to a safe single path component
///
/// Keeps ASCII letters, digits, `.`, `_` and `-`; runs of anything else
/// (including path separators and whitespace) become a single `_`. Leading
/// and trailing `.`/`_` are stripped so the result is never hidden or a
/// relative path element.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_simple_names() {
        assert_eq!(sanitize_filename("heart_01.wav"), "heart_01.wav");
        assert_eq!(sanitize_filename("a-b.c.flac"), "a-b.c.flac");
    }

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\beat.wav"), "C_Users_me_beat.wav");
        assert_eq!(sanitize_filename(".hidden.wav"), "hidden.wav");
    }

    #[test]
    fn test_sanitize_collapses_spaces_and_unicode() {
        assert_eq!(sanitize_filename("my  lung sound.wav"), "my_lung_sound.wav");
        assert_eq!(sanitize_filename("сердце.wav"), "wav");
    }

    #[test]
    fn test_sanitize_fallback() {
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename("../.."), "upload");
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::persist(dir.path(), "beat.wav", b"RIFF").await.unwrap();
        let path = upload.path().to_path_buf();

        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("-beat.wav"));

        upload.remove();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let upload = TempUpload::persist(dir.path(), "beat.wav", b"RIFF").await.unwrap();
            upload.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempUpload::persist(dir.path(), "beat.wav", b"a").await.unwrap();
        let b = TempUpload::persist(dir.path(), "beat.wav", b"b").await.unwrap();
        assert_ne!(a.path(), b.path());
    }
}
