//! Session state: the explicit machine behind the removal flow.
//!
//! A [`Session`] owns everything the flow tracks — the selected image, both
//! previews, the credential, the error message — and a [`Phase`] that only
//! moves through the pure transition function [`Phase::apply`]. Keeping
//! transitions pure makes every state sequence testable without a rendered
//! UI or a live API.
//!
//! ## Phases
//!
//! ```text
//! Idle ──▶ IntakePending ──▶ AwaitingCredential ──▶ Processing ──▶ Ready
//!              │                                        │
//!              └──────────────▶ Error ◀─────────────────┘
//! ```
//!
//! A new file selection from *any* phase restarts at `IntakePending`,
//! clearing the previous error and processed preview first. There is no
//! terminal phase; the machine is re-entrant per selection.
//!
//! ## Stale settlements
//!
//! Each selection bumps a monotonically increasing `generation`. A remote
//! call settlement carries the generation it was issued under and is
//! discarded when it no longer matches — a response for a superseded image
//! can never overwrite newer state. This is enforced by token comparison,
//! not by locking; the session is single-owner (`&mut self`).

use crate::config::RemovalConfig;
use crate::error::BgoneError;
use crate::output::{DataUri, RemovalOutput, RemovalStats};
use crate::pipeline::remote::{BackgroundRemover, RemovalRequest, RemoveBgClient};
use crate::pipeline::{encode, intake};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default file name for a saved cutout.
pub const DEFAULT_OUTPUT_NAME: &str = "removed-background.png";

/// The current phase of the removal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No file chosen.
    Idle,
    /// File selected, intake in progress.
    IntakePending,
    /// Preview ready but no credential; a key submission resumes the flow.
    AwaitingCredential,
    /// The remote call is in flight.
    Processing,
    /// Processed preview available; saving is allowed.
    Ready,
    /// The last attempt failed; previews are kept where available.
    Error,
}

/// Events that drive [`Phase::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new file was selected (from any phase).
    FileSelected,
    /// Intake finished; whether a credential is on hand decides the branch.
    IntakeSucceeded { credential_present: bool },
    /// Intake rejected or failed to read the file.
    IntakeFailed,
    /// A non-empty credential was submitted while one was awaited.
    CredentialSubmitted,
    /// The remote call settled with the cutout.
    CallSucceeded,
    /// The remote call settled with an error.
    CallFailed,
}

impl Phase {
    /// Pure transition function: `(phase, event) → phase`.
    ///
    /// Events that make no sense in the current phase leave it unchanged,
    /// which is what makes discarding stale settlements safe.
    pub fn apply(self, event: &SessionEvent) -> Phase {
        use SessionEvent::*;
        match (self, event) {
            (_, FileSelected) => Phase::IntakePending,
            (Phase::IntakePending, IntakeSucceeded { credential_present: true }) => Phase::Processing,
            (Phase::IntakePending, IntakeSucceeded { credential_present: false }) => {
                Phase::AwaitingCredential
            }
            (Phase::IntakePending, IntakeFailed) => Phase::Error,
            (Phase::AwaitingCredential, CredentialSubmitted) => Phase::Processing,
            (Phase::Processing, CallSucceeded) => Phase::Ready,
            (Phase::Processing, CallFailed) => Phase::Error,
            (current, _) => current,
        }
    }
}

/// One user's removal flow: selection, credential, remote call, download.
pub struct Session {
    config: RemovalConfig,
    remover: Arc<dyn BackgroundRemover>,
    credential: Option<String>,
    phase: Phase,
    /// Bumped on every selection; settlements carrying an older value are dropped.
    generation: u64,
    source: Option<intake::SourceImage>,
    original: Option<DataUri>,
    processed: Option<DataUri>,
    error_message: Option<String>,
    intake_ms: u64,
    upload_ms: u64,
    output_bytes: usize,
}

impl Session {
    /// Create a session. The credential is seeded from the config (explicit
    /// key or `REMOVE_BG_API_KEY`); absence is not an error — the session
    /// parks in `AwaitingCredential` after intake instead.
    pub fn new(config: RemovalConfig) -> Result<Self, BgoneError> {
        let remover: Arc<dyn BackgroundRemover> = match config.remover.clone() {
            Some(r) => r,
            None => Arc::new(RemoveBgClient::new(
                config.endpoint.clone(),
                config.api_timeout_secs,
            )?),
        };
        let credential = config.resolved_api_key();

        Ok(Self {
            config,
            remover,
            credential,
            phase: Phase::Idle,
            generation: 0,
            source: None,
            original: None,
            processed: None,
            error_message: None,
            intake_ms: 0,
            upload_ms: 0,
            output_bytes: 0,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Data-URI of the selected image, once intake has completed.
    pub fn original_preview(&self) -> Option<&DataUri> {
        self.original.as_ref()
    }

    /// Data-URI of the cutout; only set after a successful call for the
    /// most recently selected image.
    pub fn processed_preview(&self) -> Option<&DataUri> {
        self.processed.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn credential_present(&self) -> bool {
        self.credential.is_some()
    }

    // ── Operations ────────────────────────────────────────────────────────

    /// Select a file from disk and run intake.
    ///
    /// Clears the previous error and processed preview before anything else,
    /// then reads and validates the file. With a credential on hand the
    /// remote call runs immediately; otherwise the session parks in
    /// [`Phase::AwaitingCredential`] retaining the image for later
    /// resubmission.
    pub async fn select_file(&mut self, path: impl AsRef<Path>) -> Result<Phase, BgoneError> {
        let path = path.as_ref();
        info!("Selected file: {}", path.display());
        self.begin_selection();

        let started = Instant::now();
        match intake::read_source(path) {
            Ok(source) => self.finish_intake(source, started).await,
            Err(e) => self.fail_intake(e),
        }
    }

    /// Select raw bytes (clipboard, network buffer) instead of a file.
    ///
    /// `file_name` participates in the declared-type check when it carries
    /// an extension and is forwarded to the API.
    pub async fn select_bytes(
        &mut self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<Phase, BgoneError> {
        info!("Selected {} in-memory bytes as '{}'", bytes.len(), file_name);
        self.begin_selection();

        let started = Instant::now();
        match intake::source_from_bytes(bytes, file_name) {
            Ok(source) => self.finish_intake(source, started).await,
            Err(e) => self.fail_intake(e),
        }
    }

    /// Submit a credential. A blank submission is a no-op. When the session
    /// is awaiting a credential with a retained image, this issues exactly
    /// one remote call for it.
    pub async fn submit_credential(&mut self, key: &str) -> Result<Phase, BgoneError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(self.phase);
        }
        self.credential = Some(key.to_string());

        if self.phase == Phase::AwaitingCredential && self.source.is_some() {
            self.error_message = None;
            self.phase = self.phase.apply(&SessionEvent::CredentialSubmitted);
            let generation = self.generation;
            self.process(generation).await
        } else {
            Ok(self.phase)
        }
    }

    /// Save the processed cutout. Only valid in [`Phase::Ready`]; mutates no
    /// tracked state. `path` defaults to [`DEFAULT_OUTPUT_NAME`] in the
    /// current directory.
    pub async fn save_processed(&self, path: Option<&Path>) -> Result<PathBuf, BgoneError> {
        if self.phase != Phase::Ready {
            return Err(BgoneError::Internal(format!(
                "no processed image to save (phase: {:?})",
                self.phase
            )));
        }
        let processed = self
            .processed
            .as_ref()
            .ok_or_else(|| BgoneError::Internal("Ready phase without processed preview".into()))?;
        let bytes = processed
            .decode()
            .map_err(|e| BgoneError::Internal(format!("corrupt preview payload: {e}")))?;

        let target = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_NAME));

        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| BgoneError::OutputWriteFailed {
                path: target.clone(),
                source: e,
            })?;

        info!("Saved cutout to {}", target.display());
        Ok(target)
    }

    /// Consume the session and return the removal output. Only valid in
    /// [`Phase::Ready`].
    pub fn into_output(self) -> Result<RemovalOutput, BgoneError> {
        if self.phase != Phase::Ready {
            return Err(BgoneError::Internal(format!(
                "no output available (phase: {:?})",
                self.phase
            )));
        }
        let original = self
            .original
            .ok_or_else(|| BgoneError::Internal("Ready phase without original preview".into()))?;
        let processed = self
            .processed
            .ok_or_else(|| BgoneError::Internal("Ready phase without processed preview".into()))?;
        let input_bytes = self.source.as_ref().map(|s| s.bytes.len()).unwrap_or(0);

        Ok(RemovalOutput {
            original,
            processed,
            stats: RemovalStats {
                input_bytes,
                output_bytes: self.output_bytes,
                intake_duration_ms: self.intake_ms,
                upload_duration_ms: self.upload_ms,
                total_duration_ms: self.intake_ms + self.upload_ms,
            },
        })
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// A new selection supersedes everything: bump the generation so any
    /// still-unsettled call becomes stale, and clear per-attempt state.
    fn begin_selection(&mut self) {
        self.generation += 1;
        self.processed = None;
        self.error_message = None;
        self.source = None;
        self.output_bytes = 0;
        self.upload_ms = 0;
        self.phase = self.phase.apply(&SessionEvent::FileSelected);
    }

    fn fail_intake(&mut self, error: BgoneError) -> Result<Phase, BgoneError> {
        self.error_message = Some(error.to_string());
        self.phase = self.phase.apply(&SessionEvent::IntakeFailed);
        Err(error)
    }

    async fn finish_intake(
        &mut self,
        source: intake::SourceImage,
        started: Instant,
    ) -> Result<Phase, BgoneError> {
        self.intake_ms = started.elapsed().as_millis() as u64;
        self.original = Some(encode::to_data_uri(&source.bytes, &source.mime));
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_intake_complete(&source.file_name, source.bytes.len());
        }

        let credential_present = self.credential.is_some();
        self.source = Some(source);
        self.phase = self
            .phase
            .apply(&SessionEvent::IntakeSucceeded { credential_present });

        if credential_present {
            let generation = self.generation;
            self.process(generation).await
        } else {
            debug!("No credential on hand; awaiting submission");
            Ok(self.phase)
        }
    }

    /// Issue the remote call for the retained image. The phase is already
    /// `Processing` when this runs, and settlement always leaves it —
    /// success or failure — provided the generation is still current.
    async fn process(&mut self, generation: u64) -> Result<Phase, BgoneError> {
        debug_assert_eq!(self.phase, Phase::Processing);

        let prepared: Result<RemovalRequest, BgoneError> = (|| {
            let source = self
                .source
                .as_ref()
                .ok_or_else(|| BgoneError::Internal("no image retained for the call".into()))?;
            let api_key = self.credential.clone().ok_or(BgoneError::MissingCredential)?;
            Ok(RemovalRequest {
                image: source.bytes.clone(),
                file_name: source.file_name.clone(),
                mime: source.mime.clone(),
                size: self.config.size.clone(),
                api_key,
            })
        })();

        let request = match prepared {
            Ok(r) => r,
            Err(e) => return self.apply_settlement(generation, Err(e), 0),
        };

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_upload_start(request.image.len());
        }

        let remover = Arc::clone(&self.remover);
        let started = Instant::now();
        let result = remover.remove(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.apply_settlement(generation, result, elapsed_ms)
    }

    /// Apply a remote-call settlement. Settlements from a superseded
    /// generation are discarded without touching any state.
    fn apply_settlement(
        &mut self,
        generation: u64,
        result: Result<Vec<u8>, BgoneError>,
        elapsed_ms: u64,
    ) -> Result<Phase, BgoneError> {
        if generation != self.generation {
            debug!(
                "Discarding stale settlement (generation {} superseded by {})",
                generation, self.generation
            );
            return Ok(self.phase);
        }

        self.upload_ms = elapsed_ms;
        match result {
            Ok(bytes) => {
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_upload_complete(bytes.len(), elapsed_ms);
                }
                self.output_bytes = bytes.len();
                self.processed = Some(encode::cutout_to_data_uri(&bytes));
                self.phase = self.phase.apply(&SessionEvent::CallSucceeded);
                Ok(self.phase)
            }
            Err(e) => {
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_upload_error(&e.to_string());
                }
                self.error_message = Some(e.to_string());
                self.phase = self.phase.apply(&SessionEvent::CallFailed);
                Err(e)
            }
        }
    }
}
