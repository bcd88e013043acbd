/// Host file reader
///
/// Turns a local file into a data URI. The MIME type comes from the file
/// extension, the same way a file chooser labels a file's type.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::state::data::DataUri;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// MIME type of an image file, or `None` when the file is not an image
pub fn image_mime(path: &Path) -> Option<&'static str> {
    mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| mime.starts_with("image/"))
}

/// Extensions offered by the file picker filter
///
/// Every extension listed here passes `image_mime`, and vice versa.
pub fn picker_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = mime_guess::get_mime_extensions_str("image/*")
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|ext| image_mime(Path::new(&format!("file.{}", ext))).is_some())
        .collect();
    extensions.sort_unstable();
    extensions.dedup();
    extensions
}

/// Read a file into a data URI using the MIME type its extension implies
///
/// Callers are expected to have checked `image_mime` first; a path with no
/// known type is encoded as `application/octet-stream`.
pub async fn read_data_uri(path: PathBuf) -> Result<DataUri, ReadError> {
    let bytes = tokio::fs::read(&path).await.map_err(|e| ReadError::Io {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let mime = image_mime(&path).unwrap_or("application/octet-stream");

    tracing::debug!(path = %path.display(), mime, bytes = bytes.len(), "file read");
    Ok(DataUri::encode(mime, &bytes))
}
