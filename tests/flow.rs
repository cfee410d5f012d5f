//! Integration tests for the full removal flow.
//!
//! All remote traffic goes through a [`MockRemover`] injected via the config;
//! no test talks to the real API. Each scenario follows the session from
//! selection to settlement and checks the phase sequence, the previews, and
//! how many calls actually went out.

use async_trait::async_trait;
use bgone::{
    remove_background, remove_background_from_bytes, remove_background_to_file, inspect,
    BackgroundRemover, BgoneError, Phase, RemovalConfig, RemovalRequest, Session, API_KEY_ENV,
};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test doubles ─────────────────────────────────────────────────────────────

enum MockResponse {
    Cutout(Vec<u8>),
    Reject { status: u16, detail: String },
}

/// Records every request and answers with a canned response.
struct MockRemover {
    calls: AtomicUsize,
    last_request: Mutex<Option<RemovalRequest>>,
    response: MockResponse,
}

impl MockRemover {
    fn cutout(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            response: MockResponse::Cutout(bytes.to_vec()),
        })
    }

    fn reject(status: u16, detail: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            response: MockResponse::Reject {
                status,
                detail: detail.to_string(),
            },
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove(&self, request: RemovalRequest) -> Result<Vec<u8>, BgoneError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        match &self.response {
            MockResponse::Cutout(bytes) => Ok(bytes.clone()),
            MockResponse::Reject { status, detail } => Err(BgoneError::RemoteRejected {
                status: *status,
                detail: detail.clone(),
            }),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

const CANNED_CUTOUT: &[u8] = b"\x89PNG\r\n\x1a\ncanned-cutout-bytes";

fn encode_image(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, image::Rgba([10, 20, 30, 255])));
    // JPEG has no alpha channel.
    let img = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    };
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).expect("encode");
    buf
}

/// Write fixture files into a temp dir; returns (dir, jpeg path, txt path).
fn fixture_dir() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let jpeg = dir.path().join("photo.jpg");
    std::fs::write(&jpeg, encode_image(ImageFormat::Jpeg)).expect("write jpeg");
    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, b"not an image").expect("write txt");
    (dir, jpeg, txt)
}

fn config_with(remover: Arc<MockRemover>, api_key: Option<&str>) -> RemovalConfig {
    // Tests control the credential explicitly; a dev shell's key must not leak in.
    std::env::remove_var(API_KEY_ENV);
    let mut builder = RemovalConfig::builder().remover(remover);
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    builder.build().expect("config")
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_file_is_rejected_without_any_call() {
    let (_dir, _jpeg, txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let mut session = Session::new(config_with(Arc::clone(&remover), Some("abc123"))).unwrap();

    let err = session.select_file(&txt).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Please select an image file (PNG, JPG, JPEG, etc.)"
    );
    assert_eq!(
        session.error_message(),
        Some("Please select an image file (PNG, JPG, JPEG, etc.)")
    );
    assert_eq!(remover.call_count(), 0, "no network call may be recorded");
    assert!(session.processed_preview().is_none());
}

#[tokio::test]
async fn jpeg_with_credential_goes_straight_to_ready() {
    let (_dir, jpeg, _txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let mut session = Session::new(config_with(Arc::clone(&remover), Some("abc123"))).unwrap();

    let phase = session.select_file(&jpeg).await.expect("flow");
    assert_eq!(phase, Phase::Ready);
    assert_eq!(remover.call_count(), 1);

    // The processed preview round-trips to exactly the API's bytes.
    let processed = session.processed_preview().expect("processed preview");
    assert_eq!(processed.mime(), "image/png");
    assert_eq!(processed.decode().expect("base64"), CANNED_CUTOUT);

    // The request carried the fixed parameter, the credential, and the image.
    let request = remover.last_request.lock().unwrap().take().expect("request");
    assert_eq!(request.size, "auto");
    assert_eq!(request.api_key, "abc123");
    assert_eq!(request.mime, "image/jpeg");
    assert_eq!(request.file_name, "photo.jpg");
    assert_eq!(request.image, std::fs::read(&jpeg).unwrap());
}

#[tokio::test]
async fn missing_credential_parks_then_resumes_on_submission() {
    let (_dir, jpeg, _txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let mut session = Session::new(config_with(Arc::clone(&remover), None)).unwrap();

    let phase = session.select_file(&jpeg).await.expect("intake");
    assert_eq!(phase, Phase::AwaitingCredential);
    assert!(session.original_preview().is_some(), "preview ready while waiting");
    assert_eq!(remover.call_count(), 0);

    let phase = session.submit_credential("abc123").await.expect("flow");
    assert_eq!(phase, Phase::Ready);
    assert_eq!(remover.call_count(), 1, "exactly one call per submission");

    let request = remover.last_request.lock().unwrap().take().expect("request");
    assert_eq!(request.api_key, "abc123");

    let processed = session.processed_preview().expect("processed preview");
    assert_eq!(processed.decode().expect("base64"), CANNED_CUTOUT);
}

#[tokio::test]
async fn api_rejection_surfaces_the_error_title() {
    let (_dir, jpeg, _txt) = fixture_dir();
    let remover = MockRemover::reject(402, "Insufficient credits");
    let mut session = Session::new(config_with(Arc::clone(&remover), Some("abc123"))).unwrap();

    let err = session.select_file(&jpeg).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error removing background: Insufficient credits"
    );
    assert_eq!(session.phase(), Phase::Error);
    assert_eq!(
        session.error_message(),
        Some("Error removing background: Insufficient credits")
    );
    assert!(session.processed_preview().is_none());
    // The original preview is kept so the UI can still show what was selected.
    assert!(session.original_preview().is_some());
}

#[tokio::test]
async fn new_selection_clears_previous_result_and_error() {
    let (_dir, jpeg, txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let mut session = Session::new(config_with(Arc::clone(&remover), Some("abc123"))).unwrap();

    // First run succeeds.
    session.select_file(&jpeg).await.expect("flow");
    assert_eq!(session.phase(), Phase::Ready);
    assert!(session.processed_preview().is_some());

    // Selecting a non-image clears the stale cutout before failing intake.
    let _ = session.select_file(&txt).await.unwrap_err();
    assert_eq!(session.phase(), Phase::Error);
    assert!(session.processed_preview().is_none());
    assert!(session.error_message().is_some());

    // And a fresh valid selection clears the error and recovers.
    let phase = session.select_file(&jpeg).await.expect("flow");
    assert_eq!(phase, Phase::Ready);
    assert!(session.error_message().is_none());
    assert_eq!(remover.call_count(), 2);
}

#[tokio::test]
async fn save_writes_the_cutout_bytes() {
    let (dir, jpeg, _txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let mut session = Session::new(config_with(remover, Some("abc123"))).unwrap();

    session.select_file(&jpeg).await.expect("flow");
    let target = dir.path().join("cutout.png");
    let saved = session.save_processed(Some(&target)).await.expect("save");
    assert_eq!(saved, target);
    assert_eq!(std::fs::read(&target).unwrap(), CANNED_CUTOUT);

    // Saving mutates nothing: the session is still Ready with its previews.
    assert_eq!(session.phase(), Phase::Ready);
    assert!(session.processed_preview().is_some());
}

// ── Eager API ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn eager_api_returns_output_and_stats() {
    let (_dir, jpeg, _txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let config = config_with(Arc::clone(&remover), Some("abc123"));

    let output = remove_background(&jpeg, &config).await.expect("removal");
    assert_eq!(output.processed.decode().unwrap(), CANNED_CUTOUT);
    assert_eq!(output.stats.output_bytes, CANNED_CUTOUT.len());
    assert_eq!(output.stats.input_bytes, std::fs::read(&jpeg).unwrap().len());
    assert_eq!(
        output.original.decode().unwrap(),
        std::fs::read(&jpeg).unwrap()
    );
}

#[tokio::test]
async fn eager_api_requires_a_credential() {
    let (_dir, jpeg, _txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let config = config_with(Arc::clone(&remover), None);

    let err = remove_background(&jpeg, &config).await.unwrap_err();
    assert!(matches!(err, BgoneError::MissingCredential));
    assert_eq!(remover.call_count(), 0);
}

#[tokio::test]
async fn eager_api_accepts_in_memory_bytes() {
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let config = config_with(Arc::clone(&remover), Some("abc123"));

    let png = encode_image(ImageFormat::Png);
    let output = remove_background_from_bytes(png.clone(), "pasted.png", &config)
        .await
        .expect("removal");
    assert_eq!(output.stats.input_bytes, png.len());

    let request = remover.last_request.lock().unwrap().take().expect("request");
    assert_eq!(request.file_name, "pasted.png");
    assert_eq!(request.mime, "image/png");
}

#[tokio::test]
async fn to_file_writes_atomically_named_target() {
    let (dir, jpeg, _txt) = fixture_dir();
    let remover = MockRemover::cutout(CANNED_CUTOUT);
    let config = config_with(remover, Some("abc123"));

    let target = dir.path().join("out/removed-background.png");
    let stats = remove_background_to_file(&jpeg, &target, &config)
        .await
        .expect("removal");
    assert_eq!(std::fs::read(&target).unwrap(), CANNED_CUTOUT);
    assert_eq!(stats.output_bytes, CANNED_CUTOUT.len());
    // No temp file left behind.
    assert!(!dir.path().join("out/removed-background.png.tmp").exists());
}

// ── Inspection ───────────────────────────────────────────────────────────────

#[test]
fn inspect_reports_details_without_a_credential() {
    let (_dir, jpeg, _txt) = fixture_dir();
    std::env::remove_var(API_KEY_ENV);

    let details = inspect(&jpeg).expect("inspect");
    assert_eq!(details.mime, "image/jpeg");
    assert_eq!((details.width, details.height), (8, 6));
    assert_eq!(details.file_name, "photo.jpg");
}

#[test]
fn inspect_rejects_non_images() {
    let (_dir, _jpeg, txt) = fixture_dir();
    let err = inspect(&txt).unwrap_err();
    assert!(matches!(err, BgoneError::InvalidInputType { .. }));
}
