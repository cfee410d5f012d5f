//! Progress-callback trait for removal events.
//!
//! Inject an [`Arc<dyn RemovalProgressCallback>`] via
//! [`crate::config::RemovalConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through intake and upload.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a progress bar, a GUI thread, or a log sink without the
//! library knowing anything about how the host application renders. The trait
//! is `Send + Sync` so a single callback can be shared across sessions.

use std::sync::Arc;

/// Called by the pipeline as a removal progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RemovalProgressCallback: Send + Sync {
    /// Called when the input file has been read and validated.
    ///
    /// # Arguments
    /// * `file_name` — name the file was selected under
    /// * `bytes`     — size of the image in bytes
    fn on_intake_complete(&self, file_name: &str, bytes: usize) {
        let _ = (file_name, bytes);
    }

    /// Called immediately before the multipart request is sent.
    fn on_upload_start(&self, bytes: usize) {
        let _ = bytes;
    }

    /// Called when the API returned the cutout.
    ///
    /// # Arguments
    /// * `bytes`      — size of the returned PNG
    /// * `elapsed_ms` — wall-clock duration of the remote call
    fn on_upload_complete(&self, bytes: usize, elapsed_ms: u64) {
        let _ = (bytes, elapsed_ms);
    }

    /// Called when the remote call settled with an error.
    fn on_upload_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RemovalProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RemovalConfig`].
pub type ProgressCallback = Arc<dyn RemovalProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        intakes: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl RemovalProgressCallback for TrackingCallback {
        fn on_intake_complete(&self, _file_name: &str, _bytes: usize) {
            self.intakes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_upload_start(&self, _bytes: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_upload_complete(&self, _bytes: usize, _elapsed_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_upload_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_intake_complete("photo.jpg", 1024);
        cb.on_upload_start(1024);
        cb.on_upload_complete(2048, 850);
        cb.on_upload_error("quota exceeded");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            intakes: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };

        tracker.on_intake_complete("a.png", 10);
        tracker.on_upload_start(10);
        tracker.on_upload_error("402");
        tracker.on_upload_start(10);
        tracker.on_upload_complete(20, 5);

        assert_eq!(tracker.intakes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RemovalProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_upload_start(512);
        cb.on_upload_complete(512, 100);
    }
}
