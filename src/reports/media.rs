//! Storage for files attached to a report.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::MediaError;

/// Reduce an uploaded file name to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Names that end up empty or consist only of dots are rejected.
pub fn sanitize_filename(original: &str) -> Result<String, MediaError> {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(MediaError::Rejected {
            filename: original.to_string(),
            reason: "empty file name".to_string(),
        });
    }
    Ok(cleaned)
}

/// Writes report attachments into one directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Save one attachment as `<report_id>_<sanitized name>` and return its
    /// path.
    pub async fn save(
        &self,
        report_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, MediaError> {
        let name = format!("{report_id}_{}", sanitize_filename(filename)?);
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Attachment saved");
        Ok(path)
    }

    /// Remove attachments whose report was never stored. Failures are only
    /// logged.
    pub async fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "Orphaned attachment removed"),
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove orphaned attachment"),
            }
        }
    }
}
