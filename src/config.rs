//! Configuration for background removal.
//!
//! All behaviour is controlled through [`RemovalConfig`], built via its
//! [`RemovalConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across sessions and to see in one place what a
//! run will do.
//!
//! # Where the credential comes from
//!
//! The API key is **never compiled into the crate**. It is resolved at run
//! time, most-specific first: an explicit `api_key` on the config, then the
//! `REMOVE_BG_API_KEY` environment variable. When neither is set, the eager
//! API fails with [`BgoneError::MissingCredential`] and the interactive
//! session asks the user instead.

use crate::error::BgoneError;
use crate::pipeline::remote::{BackgroundRemover, REMOVE_BG_ENDPOINT};
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Environment variable consulted when no explicit key is configured.
pub const API_KEY_ENV: &str = "REMOVE_BG_API_KEY";

/// Configuration for a removal run.
///
/// Built via [`RemovalConfig::builder()`] or [`RemovalConfig::default()`].
///
/// # Example
/// ```rust
/// use bgone::RemovalConfig;
///
/// let config = RemovalConfig::builder()
///     .api_key("abc123")
///     .size("auto")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RemovalConfig {
    /// Explicit API key. When `None`, `REMOVE_BG_API_KEY` is consulted.
    pub api_key: Option<String>,

    /// Endpoint URL. Default: the production remove.bg endpoint. Overridable
    /// for proxies and test servers.
    pub endpoint: String,

    /// The `size` form field. Default: `"auto"` — the API picks the output
    /// resolution. Other values ("preview", "full", …) follow the API docs.
    pub size: String,

    /// Per-call HTTP timeout in seconds. Default: 60.
    ///
    /// Uploads of large images over slow links dominate this budget; the
    /// segmentation itself typically settles in a few seconds.
    pub api_timeout_secs: u64,

    /// Pre-constructed remover. Takes precedence over the built-in HTTP
    /// client; the seam for tests and middleware.
    pub remover: Option<Arc<dyn BackgroundRemover>>,

    /// Progress callback invoked at intake and upload boundaries.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: REMOVE_BG_ENDPOINT.to_string(),
            size: "auto".to_string(),
            api_timeout_secs: 60,
            remover: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RemovalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalConfig")
            // Never print the key itself.
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("size", &self.size)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("remover", &self.remover.as_ref().map(|_| "<dyn BackgroundRemover>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RemovalProgressCallback>"),
            )
            .finish()
    }
}

impl RemovalConfig {
    /// Create a new builder for `RemovalConfig`.
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the credential, most-specific first: explicit key, then the
    /// `REMOVE_BG_API_KEY` environment variable. Blank values count as unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.trim().is_empty() {
                return Some(key.trim().to_string());
            }
        }
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Some(key.trim().to_string()),
            _ => None,
        }
    }
}

/// Builder for [`RemovalConfig`].
#[derive(Debug)]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.config.size = size.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn remover(mut self, remover: Arc<dyn BackgroundRemover>) -> Self {
        self.config.remover = Some(remover);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RemovalConfig, BgoneError> {
        let c = &self.config;
        if c.endpoint.trim().is_empty() {
            return Err(BgoneError::InvalidConfig("Endpoint must not be empty".into()));
        }
        if !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(BgoneError::InvalidConfig(format!(
                "Endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.size.trim().is_empty() {
            return Err(BgoneError::InvalidConfig("Size parameter must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_production_endpoint() {
        let config = RemovalConfig::default();
        assert_eq!(config.endpoint, REMOVE_BG_ENDPOINT);
        assert_eq!(config.size, "auto");
        assert_eq!(config.api_timeout_secs, 60);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = RemovalConfig::builder()
            .endpoint("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, BgoneError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_size() {
        let err = RemovalConfig::builder().size("  ").build().unwrap_err();
        assert!(matches!(err, BgoneError::InvalidConfig(_)));
    }

    #[test]
    fn timeout_is_clamped_to_at_least_one_second() {
        let config = RemovalConfig::builder()
            .api_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.api_timeout_secs, 1);
    }

    #[test]
    fn explicit_key_wins_and_is_trimmed() {
        let config = RemovalConfig::builder().api_key(" abc123 ").build().unwrap();
        assert_eq!(config.resolved_api_key().as_deref(), Some("abc123"));
    }

    #[test]
    fn blank_explicit_key_counts_as_unset() {
        let config = RemovalConfig::builder().api_key("   ").build().unwrap();
        // Falls through to the environment; may be Some in a dev shell, but a
        // blank explicit key must never be returned as-is.
        assert_ne!(config.resolved_api_key().as_deref(), Some(""));
    }

    #[test]
    fn debug_never_prints_the_key() {
        let config = RemovalConfig::builder().api_key("hunter2").build().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"), "got: {debug}");
    }
}
