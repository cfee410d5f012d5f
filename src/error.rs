//! Error types for the bgone library.
//!
//! Every failure is terminal for the current attempt and is surfaced directly
//! to the caller — nothing is retried automatically and nothing is fatal to
//! the process. An interactive [`crate::session::Session`] records the same
//! errors as its on-screen message, so the `Display` strings here are written
//! for end users, not for logs.
//!
//! [`BgoneError::MissingCredential`] is a borderline case: the eager API
//! treats it as a hard error, while the session routes it to the
//! `AwaitingCredential` phase and asks the user for a key instead.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the bgone library.
#[derive(Debug, Error)]
pub enum BgoneError {
    // ── Intake errors ─────────────────────────────────────────────────────
    /// The selected file's declared type is not an image. No remote call is
    /// attempted. The message is the exact text shown to the user.
    #[error("Please select an image file (PNG, JPG, JPEG, etc.)")]
    InvalidInputType { path: PathBuf },

    /// The file looked like an image but could not be read or decoded.
    #[error("failed to read file '{path}': {detail}")]
    FileReadFailure { path: PathBuf, detail: String },

    // ── Credential errors ─────────────────────────────────────────────────
    /// No API key was available at submission time.
    #[error("No API key configured.\nSet REMOVE_BG_API_KEY or pass one explicitly.")]
    MissingCredential,

    // ── Remote call errors ────────────────────────────────────────────────
    /// The API answered with a non-2xx status. `detail` is the most specific
    /// description available: the first `errors[].title` of a structured
    /// body, else `"<status code>: <reason>"`.
    #[error("Error removing background: {detail}")]
    RemoteRejected { status: u16, detail: String },

    /// The request never produced an HTTP response (DNS, connect, TLS…).
    #[error("Error removing background: {reason}")]
    NetworkFailure { reason: String },

    /// The API call exceeded the configured timeout.
    #[error("Error removing background: request timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the downloaded cutout to disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
