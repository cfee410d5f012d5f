//! Pipeline stages for background removal.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap the remote
//! client (e.g. a mock in tests) without touching intake or encoding.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ encode ──▶ remote ──▶ encode
//! (read+    (original   (multipart  (cutout
//!  sniff)    data-URI)   upload)     data-URI)
//! ```
//!
//! 1. [`intake`] — read the selected file, validate it is an image, sniff
//!    its real format from the magic bytes
//! 2. [`encode`] — wrap raw bytes in a base64 data-URI for display
//! 3. [`remote`] — the single outbound call to the remove.bg endpoint;
//!    the only stage with network I/O

pub mod encode;
pub mod intake;
pub mod remote;
