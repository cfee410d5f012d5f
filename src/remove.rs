//! Eager (one-shot) entry points.
//!
//! These wrap a [`crate::session::Session`] for callers that do not need the
//! interactive flow: select, call, return. Unlike the session — which parks
//! in `AwaitingCredential` and waits for the user — the eager API treats a
//! missing credential as a hard [`BgoneError::MissingCredential`], because
//! there is nobody to ask.

use crate::config::RemovalConfig;
use crate::error::BgoneError;
use crate::output::{ImageDetails, RemovalOutput, RemovalStats};
use crate::pipeline::intake;
use crate::session::{Phase, Session};
use std::path::Path;
use tracing::info;

/// Remove the background of an image file.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`  — path to a local image file
/// * `config` — removal configuration (credential, endpoint, size…)
///
/// # Errors
/// * [`BgoneError::MissingCredential`] when no key is configured
/// * [`BgoneError::InvalidInputType`] / [`BgoneError::FileReadFailure`] from intake
/// * [`BgoneError::RemoteRejected`] and friends from the API call
pub async fn remove_background(
    input: impl AsRef<Path>,
    config: &RemovalConfig,
) -> Result<RemovalOutput, BgoneError> {
    let mut session = Session::new(config.clone())?;
    if !session.credential_present() {
        return Err(BgoneError::MissingCredential);
    }

    let phase = session.select_file(input).await?;
    debug_assert_eq!(phase, Phase::Ready);
    session.into_output()
}

/// Remove the background of an in-memory image.
///
/// `file_name` participates in type validation when it carries an extension
/// and is forwarded to the API in the multipart upload.
pub async fn remove_background_from_bytes(
    bytes: Vec<u8>,
    file_name: &str,
    config: &RemovalConfig,
) -> Result<RemovalOutput, BgoneError> {
    let mut session = Session::new(config.clone())?;
    if !session.credential_present() {
        return Err(BgoneError::MissingCredential);
    }

    let phase = session.select_bytes(bytes, file_name).await?;
    debug_assert_eq!(phase, Phase::Ready);
    session.into_output()
}

/// Remove a background and write the cutout PNG directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn remove_background_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RemovalConfig,
) -> Result<RemovalStats, BgoneError> {
    let output = remove_background(input, config).await?;
    let path = output_path.as_ref();
    let bytes = output
        .processed
        .decode()
        .map_err(|e| BgoneError::Internal(format!("corrupt preview payload: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BgoneError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("png.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| BgoneError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| BgoneError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Wrote cutout to {}", path.display());
    Ok(output.stats)
}

/// Synchronous wrapper around [`remove_background`].
///
/// Creates a temporary tokio runtime internally.
pub fn remove_background_sync(
    input: impl AsRef<Path>,
    config: &RemovalConfig,
) -> Result<RemovalOutput, BgoneError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BgoneError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(remove_background(input, config))
}

/// Report an image's format, dimensions, and size without calling the API.
///
/// Does not require a credential.
pub fn inspect(input: impl AsRef<Path>) -> Result<ImageDetails, BgoneError> {
    let source = intake::read_source(input.as_ref())?;
    intake::image_details(&source)
}
