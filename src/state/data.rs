/// Shared data structures for the widget state
///
/// A `DataUri` is the single representation every acquisition path
/// (camera, picker, drop) is normalized into before it reaches the store.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use thiserror::Error;

/// Errors produced while parsing or decoding a data URI
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataUriError {
    #[error("missing `data:` scheme")]
    MissingScheme,
    #[error("only base64 data URIs are supported")]
    MissingBase64,
    #[error("data URI has no MIME type")]
    EmptyMime,
    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// An image embedded as `data:<mime>;base64,<payload>`
///
/// The original text is kept verbatim, so a URI handed over by the camera
/// bridge comes back out of `as_str` byte for byte.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    raw: String,
    /// End of the MIME type inside `raw`
    mime_end: usize,
    /// Start of the base64 payload inside `raw`
    payload_start: usize,
}

impl DataUri {
    const SCHEME: &'static str = "data:";
    const MARKER: &'static str = ";base64,";

    /// Encode raw bytes with the given MIME type
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        let raw = format!("{}{}{}{}", Self::SCHEME, mime, Self::MARKER, STANDARD.encode(bytes));
        let mime_end = Self::SCHEME.len() + mime.len();
        Self {
            raw,
            mime_end,
            payload_start: mime_end + Self::MARKER.len(),
        }
    }

    /// Parse a data URI string without decoding the payload
    pub fn parse(raw: impl Into<String>) -> Result<Self, DataUriError> {
        let raw = raw.into();
        if !raw.starts_with(Self::SCHEME) {
            return Err(DataUriError::MissingScheme);
        }
        let comma = raw.find(',').ok_or(DataUriError::MissingBase64)?;
        let header = &raw[Self::SCHEME.len()..comma];
        // Parameters such as `;charset=` may sit between the MIME and `;base64`
        let params = header.strip_suffix(";base64").ok_or(DataUriError::MissingBase64)?;
        let mime_len = params.find(';').unwrap_or(params.len());
        if mime_len == 0 {
            return Err(DataUriError::EmptyMime);
        }

        Ok(Self {
            mime_end: Self::SCHEME.len() + mime_len,
            payload_start: comma + 1,
            raw,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn mime(&self) -> &str {
        &self.raw[Self::SCHEME.len()..self.mime_end]
    }

    pub fn is_image(&self) -> bool {
        self.mime().starts_with("image/")
    }

    /// Decode the payload back into bytes
    pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        STANDARD
            .decode(&self.raw[self.payload_start..])
            .map_err(|e| DataUriError::Payload(e.to_string()))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// Payloads run to megabytes; keep log lines short
impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("mime", &self.mime())
            .field("len", &self.raw.len())
            .finish()
    }
}
