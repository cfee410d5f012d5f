//! Image encoding: raw bytes → base64 [`DataUri`].
//!
//! Previews are held as data-URIs because they are self-describing: the MIME
//! label travels with the payload, so a caller can hand the string straight
//! to an `<img>` tag, a JSON report, or a terminal viewer without tracking
//! the type separately. Encoding is a pure pass-through — the API's PNG bytes
//! are never touched locally, only wrapped.

use crate::output::DataUri;
use tracing::debug;

/// MIME type of every cutout the remove.bg API returns.
pub const CUTOUT_MIME: &str = "image/png";

/// Wrap raw image bytes in a data-URI under the given MIME type.
pub fn to_data_uri(bytes: &[u8], mime: &str) -> DataUri {
    let uri = DataUri::from_bytes(mime, bytes);
    debug!("Encoded {} bytes → {} chars base64", bytes.len(), uri.payload().len());
    uri
}

/// Wrap the API's PNG response. The bytes are passed through verbatim.
pub fn cutout_to_data_uri(bytes: &[u8]) -> DataUri {
    to_data_uri(bytes, CUTOUT_MIME)
}
