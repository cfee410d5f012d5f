//! Output types: data-URI previews and per-run statistics.
//!
//! A [`DataUri`] is the displayable form of an image — base64-encoded bytes
//! plus a MIME label, usable directly as an `<img src>` or embeddable in a
//! JSON report. Both the original upload and the processed cutout are held in
//! this form; the raw bytes are always recoverable via [`DataUri::decode`],
//! byte-identical to what went in.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Serialize, Serializer};
use std::fmt;

/// Base64-encoded image content plus its MIME type.
///
/// Displays as `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime: String,
    payload: String,
}

impl DataUri {
    /// Encode raw bytes under the given MIME type.
    pub fn from_bytes(mime: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime: mime.into(),
            payload: STANDARD.encode(bytes),
        }
    }

    /// The MIME type label, e.g. `image/png`.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The base64 payload without the `data:` prefix.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Decode back to the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.payload)
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.payload)
    }
}

// Serialise as the full URI string so `--json` output is directly usable
// as an image source.
impl Serialize for DataUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The result of one successful background removal.
#[derive(Debug, Clone, Serialize)]
pub struct RemovalOutput {
    /// Preview of the uploaded image, as selected.
    pub original: DataUri,
    /// The cutout returned by the API, always `image/png`.
    pub processed: DataUri,
    /// Timing and size statistics for the run.
    pub stats: RemovalStats,
}

/// Statistics for a single removal run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovalStats {
    /// Size of the uploaded image in bytes.
    pub input_bytes: usize,
    /// Size of the returned PNG in bytes.
    pub output_bytes: usize,
    /// Time spent reading and validating the input.
    pub intake_duration_ms: u64,
    /// Time spent in the remote call, request to settlement.
    pub upload_duration_ms: u64,
    /// End-to-end duration.
    pub total_duration_ms: u64,
}

/// What [`crate::inspect`] reports about an image without calling the API.
#[derive(Debug, Clone, Serialize)]
pub struct ImageDetails {
    /// File name the image was selected under.
    pub file_name: String,
    /// Detected format name, e.g. `png`.
    pub format: String,
    /// MIME type, e.g. `image/png`.
    pub mime: String,
    /// Pixel dimensions.
    pub width: u32,
    pub height: u32,
    /// Size on disk in bytes.
    pub byte_len: usize,
}
