//! The remote call: one multipart POST to the remove.bg endpoint.
//!
//! This is the only stage with network I/O. The request carries exactly two
//! form fields — the literal `size` parameter and the raw `image_file`
//! bytes — plus the credential in the `X-Api-Key` header. A 2xx response
//! body is the cutout PNG, returned verbatim; anything else is decoded into
//! the most specific error description available.
//!
//! The [`BackgroundRemover`] trait is the seam for tests and middleware:
//! inject a mock via [`crate::config::RemovalConfigBuilder::remover`] and no
//! network traffic happens at all.

use crate::error::BgoneError;
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// The fixed production endpoint.
pub const REMOVE_BG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Everything needed for one removal request.
#[derive(Debug, Clone)]
pub struct RemovalRequest {
    /// Raw image bytes, uploaded unmodified.
    pub image: Vec<u8>,
    /// File name forwarded in the multipart part.
    pub file_name: String,
    /// MIME type of the upload.
    pub mime: String,
    /// The `size` form field; `"auto"` unless overridden.
    pub size: String,
    /// Credential sent as `X-Api-Key`.
    pub api_key: String,
}

/// The outbound exchange with the background-removal service.
///
/// Implementations must complete exactly once per call, with the cutout
/// bytes on success or a [`BgoneError`] on failure.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove(&self, request: RemovalRequest) -> Result<Vec<u8>, BgoneError>;
}

/// HTTP client for the remove.bg API.
pub struct RemoveBgClient {
    http: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

impl RemoveBgClient {
    /// Build a client against the given endpoint with a per-call timeout.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, BgoneError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BgoneError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove(&self, request: RemovalRequest) -> Result<Vec<u8>, BgoneError> {
        info!(
            "Uploading '{}' ({} bytes) to {}",
            request.file_name,
            request.image.len(),
            self.endpoint
        );

        let part = multipart::Part::bytes(request.image)
            .file_name(request.file_name)
            .mime_str(&request.mime)
            .map_err(|e| BgoneError::Internal(format!("multipart part: {e}")))?;

        let form = multipart::Form::new()
            .text("size", request.size)
            .part("image_file", part);

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Api-Key", &request.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BgoneError::ApiTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    BgoneError::NetworkFailure {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(BgoneError::RemoteRejected {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BgoneError::NetworkFailure {
                reason: e.to_string(),
            })?;

        debug!("Received {} cutout bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

// ── Error body decoding ──────────────────────────────────────────────────

/// Shape of the API's structured error payload:
/// `{ "errors": [ { "title": "…" } ] }`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    title: String,
}

/// Extract the most specific error description from a failed response.
///
/// Prefers the first non-empty `errors[].title`; falls back to
/// `"<status code>: <reason>"` for unstructured bodies.
fn error_detail(status: reqwest::StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ApiErrorBody>(body) {
        if let Some(title) = parsed
            .errors
            .iter()
            .map(|e| e.title.trim())
            .find(|t| !t.is_empty())
        {
            return title.to_string();
        }
    }

    format!(
        "{}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn structured_body_yields_first_title() {
        let body = br#"{"errors":[{"title":"Insufficient credits"},{"title":"second"}]}"#;
        assert_eq!(
            error_detail(StatusCode::PAYMENT_REQUIRED, body),
            "Insufficient credits"
        );
    }

    #[test]
    fn empty_titles_are_skipped() {
        let body = br#"{"errors":[{"title":"  "},{"title":"API key invalid"}]}"#;
        assert_eq!(error_detail(StatusCode::FORBIDDEN, body), "API key invalid");
    }

    #[test]
    fn unstructured_body_falls_back_to_status_line() {
        assert_eq!(
            error_detail(StatusCode::PAYMENT_REQUIRED, b"<html>nope</html>"),
            "402: Payment Required"
        );
    }

    #[test]
    fn empty_error_list_falls_back_to_status_line() {
        assert_eq!(
            error_detail(StatusCode::TOO_MANY_REQUESTS, br#"{"errors":[]}"#),
            "429: Too Many Requests"
        );
    }

    #[test]
    fn client_builds_against_custom_endpoint() {
        let client = RemoveBgClient::new("http://localhost:9999/removebg", 5).expect("client");
        assert_eq!(client.endpoint, "http://localhost:9999/removebg");
        assert_eq!(client.timeout_secs, 5);
    }
}
