//! # bgone
//!
//! Remove image backgrounds using the remove.bg HTTP API.
//!
//! ## Why this crate?
//!
//! Background segmentation is a solved problem server-side: the remove.bg
//! service takes an image and answers with a cutout PNG. What remains on the
//! client is everything around that one call — validating the input is
//! actually an image, packaging the bytes into a multipart upload, decoding
//! structured API errors into something a human can act on, and tracking the
//! flow's state so a UI (or a CLI) always knows what to show. This crate
//! does exactly that and nothing more; not a single pixel is processed
//! locally.
//!
//! ## Flow Overview
//!
//! ```text
//! image file
//!  │
//!  ├─ 1. Intake   read + sniff the file, reject non-images
//!  ├─ 2. Encode   bytes → base64 data-URI (the original preview)
//!  ├─ 3. Upload   multipart POST, `size=auto` + image bytes + X-Api-Key
//!  └─ 4. Result   PNG response → data-URI, saved as removed-background.png
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgone::{remove_background, RemovalConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from REMOVE_BG_API_KEY
//!     let config = RemovalConfig::default();
//!     let output = remove_background("photo.jpg", &config).await?;
//!     println!("{}", output.processed);
//!     eprintln!("{} bytes in / {} bytes out",
//!         output.stats.input_bytes,
//!         output.stats.output_bytes);
//!     Ok(())
//! }
//! ```
//!
//! For the interactive flow — where a missing credential pauses the session
//! instead of failing — drive a [`Session`] directly:
//!
//! ```rust,no_run
//! use bgone::{Phase, RemovalConfig, Session};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(RemovalConfig::default())?;
//! if session.select_file("photo.jpg").await? == Phase::AwaitingCredential {
//!     session.submit_credential("abc123").await?;
//! }
//! session.save_processed(None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bgone` binary (clap + anyhow + indicatif + dialoguer) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! bgone = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod remove;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RemovalConfig, RemovalConfigBuilder, API_KEY_ENV};
pub use error::BgoneError;
pub use output::{DataUri, ImageDetails, RemovalOutput, RemovalStats};
pub use pipeline::remote::{BackgroundRemover, RemovalRequest, REMOVE_BG_ENDPOINT};
pub use progress::{NoopProgressCallback, ProgressCallback, RemovalProgressCallback};
pub use remove::{
    inspect, remove_background, remove_background_from_bytes, remove_background_sync,
    remove_background_to_file,
};
pub use session::{Phase, Session, SessionEvent, DEFAULT_OUTPUT_NAME};
