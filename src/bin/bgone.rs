//! CLI binary for bgone.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RemovalConfig` and drives an interactive `Session`.

use anyhow::{Context, Result};
use bgone::{
    inspect, Phase, RemovalConfig, RemovalProgressCallback, Session, REMOVE_BG_ENDPOINT,
};
use clap::Parser;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

fn human_bytes(n: usize) -> String {
    if n >= 1024 * 1024 {
        format!("{:.1} MB", n as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} KB", n as f64 / 1024.0)
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner for the two long-running stages: intake is instant, the
/// upload is not.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        Arc::new(Self { bar })
    }
}

impl RemovalProgressCallback for CliProgressCallback {
    fn on_intake_complete(&self, file_name: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            file_name,
            dim(&human_bytes(bytes))
        ));
    }

    fn on_upload_start(&self, bytes: usize) {
        self.bar.set_prefix("Removing background");
        self.bar.set_message(format!("uploading {}", human_bytes(bytes)));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_upload_complete(&self, bytes: usize, elapsed_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} background removed  {}  {}",
            green("✔"),
            dim(&human_bytes(bytes)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        );
    }

    fn on_upload_error(&self, _error: &str) {
        // The error itself is reported by main; just stop the spinner.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic removal (writes removed-background.png)
  bgone photo.jpg

  # Choose the output file
  bgone photo.jpg -o cutout.png

  # Pass the key explicitly instead of REMOVE_BG_API_KEY
  bgone --api-key abc123 photo.jpg

  # JSON report with data-URIs and stats
  bgone --json photo.jpg > report.json

  # Inspect the image without calling the API (no key needed)
  bgone --inspect-only photo.jpg

ENVIRONMENT VARIABLES:
  REMOVE_BG_API_KEY   remove.bg API key
  BGONE_ENDPOINT      Override the API endpoint (proxies, test servers)

SETUP:
  1. Get a key:   https://www.remove.bg/api
  2. Set it:      export REMOVE_BG_API_KEY=abc123
  3. Remove:      bgone photo.jpg

  Without a key in the environment, bgone prompts for one interactively.
"#;

/// Remove image backgrounds using the remove.bg API.
#[derive(Parser, Debug)]
#[command(
    name = "bgone",
    version,
    about = "Remove image backgrounds using the remove.bg API",
    long_about = "Upload an image to the remove.bg background-removal service and save the \
resulting cutout PNG. All segmentation happens remotely; the image is uploaded exactly as-is.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image file path (PNG, JPG, GIF, WebP…).
    input: PathBuf,

    /// Write the cutout to this file instead of removed-background.png.
    #[arg(short, long, env = "BGONE_OUTPUT")]
    output: Option<PathBuf>,

    /// remove.bg API key.
    #[arg(long, env = "REMOVE_BG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// The API's `size` parameter (auto, preview, full…).
    #[arg(long, env = "BGONE_SIZE", default_value = "auto")]
    size: String,

    /// API endpoint URL.
    #[arg(long, env = "BGONE_ENDPOINT", default_value = REMOVE_BG_ENDPOINT, hide_default_value = true)]
    endpoint: String,

    /// Per-call HTTP timeout in seconds.
    #[arg(long, env = "BGONE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Output a structured JSON report (data-URIs + stats) instead of saving.
    #[arg(long, env = "BGONE_JSON")]
    json: bool,

    /// Print image details only, no API call.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "BGONE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BGONE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BGONE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let details = inspect(&cli.input).context("Failed to inspect image")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&details).context("Failed to serialise details")?
            );
        } else {
            println!("File:    {}", details.file_name);
            println!("Format:  {} ({})", details.format, details.mime);
            println!("Size:    {} × {} px", details.width, details.height);
            println!("Bytes:   {}", details.byte_len);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = RemovalConfig::builder()
        .endpoint(cli.endpoint.clone())
        .size(cli.size.clone())
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new());
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run the flow ─────────────────────────────────────────────────────
    let mut session = Session::new(config).context("Failed to initialise session")?;

    let phase = session
        .select_file(&cli.input)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if phase == Phase::AwaitingCredential {
        if cli.quiet {
            anyhow::bail!("No API key configured. Set REMOVE_BG_API_KEY or pass --api-key.");
        }
        eprintln!(
            "{}",
            bold("An API key is required (get one at https://www.remove.bg/api)")
        );
        let key: String = Input::new()
            .with_prompt("remove.bg API key")
            .interact_text()
            .context("Failed to read API key")?;

        session
            .submit_credential(&key)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }

    debug_assert_eq!(session.phase(), Phase::Ready);

    // ── Emit result ──────────────────────────────────────────────────────
    if cli.json {
        let output_path = cli.output.clone();
        let output = session
            .into_output()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
        // With -o, also save the PNG alongside the report.
        if let Some(ref path) = output_path {
            let bytes = output.processed.decode().context("Corrupt preview payload")?;
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    } else {
        let saved = session
            .save_processed(cli.output.as_deref())
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        if !cli.quiet {
            eprintln!(
                "{}  {}",
                green("✔"),
                bold(&saved.display().to_string())
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_bytes_scales() {
        assert_eq!(human_bytes(512), "0.5 KB");
        assert_eq!(human_bytes(2 * 1024 * 1024), "2.0 MB");
    }

}
