//! replydesk - Terminal Surface for Document-Assisted Replies
//!
//! Reads one command per line from stdin and drives a replydesk session
//! against the configured backend. Output goes to stdout, logs to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session with defaults
//! replydesk
//!
//! # Another backend and download directory
//! replydesk --backend-url http://10.0.0.5:8000 --download-dir ~/Downloads
//!
//! # Scripted: the session settles outstanding requests at end of input
//! printf 'pdf invoice.pdf\nemail thread.txt\ngenerate\ndownload\n' | replydesk
//!
//! # Verbose logging
//! RUST_LOG=replydesk_core=debug replydesk
//! ```

mod commands;
mod export;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use replydesk_core::intake::mime_from_name;
use replydesk_core::{
    load_config, load_config_from_path, Conductor, ConductorConfig, ConfigOverrides, FileSelection,
    HttpBackend, SessionMessage, SurfaceEvent,
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use commands::{Command, ParseError, HELP};
use export::Exporter;
use render::Renderer;

/// Capacity of the conductor-to-surface channel
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// replydesk - document-assisted email replies from the terminal
#[derive(Parser, Debug)]
#[command(name = "replydesk")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "REPLYDESK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config and environment)
    #[arg(short = 'b', long, value_name = "URL")]
    backend_url: Option<String>,

    /// Directory downloaded replies are written to
    #[arg(short = 'd', long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "REPLYDESK_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(url) = &self.backend_url {
            overrides = overrides.with_backend_url(url.clone());
        }
        if let Some(dir) = &self.download_dir {
            overrides = overrides.with_download_dir(dir.clone());
        }
        overrides
    }
}

/// Initialize logging on stderr so it never interleaves with rendered output
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("replydesk={level},replydesk_core={level}"))
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    Ok(())
}

/// Read a file from disk into a selection, typing it by extension
///
/// At most one byte past `max_bytes` is read, which is enough for validation
/// to reject an oversized file without loading all of it.
async fn read_selection(path: &Path, max_bytes: usize) -> Result<FileSelection> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let len = file
        .metadata()
        .await
        .with_context(|| format!("failed to read {}", path.display()))?
        .len();
    let cap = max_bytes.saturating_add(1);
    let mut content = Vec::with_capacity(usize::try_from(len).unwrap_or(cap).min(cap));
    file.take(cap as u64)
        .read_to_end(&mut content)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mime_type = mime_from_name(&name);
    Ok(FileSelection::new(name, mime_type, content))
}

/// Handle one input line; returns `false` when the user quits
async fn run_line(
    conductor: &mut Conductor<HttpBackend>,
    line: &str,
    max_bytes: usize,
) -> Result<bool> {
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(ParseError::Empty) => return Ok(true),
        Err(e) => {
            eprintln!("{e}");
            return Ok(true);
        }
    };

    match command {
        Command::Quit => return Ok(false),
        Command::Help => println!("{HELP}"),
        Command::Show => println!("{}", render::full(&conductor.snapshot())),
        Command::Upload { slot, path } => match read_selection(&path, max_bytes).await {
            Ok(selection) => {
                conductor
                    .handle_event(SurfaceEvent::FileSelected { slot, selection })
                    .await?;
            }
            Err(e) => eprintln!("{e:#}"),
        },
        other => {
            for event in other.into_events() {
                conductor.handle_event(event).await?;
            }
        }
    }
    Ok(true)
}

/// Carry out one message from the conductor
async fn deliver(msg: SessionMessage, renderer: &mut Renderer, exporter: &Exporter) {
    match msg {
        SessionMessage::Snapshot(snapshot) => {
            for line in renderer.update(*snapshot) {
                println!("{line}");
            }
        }
        SessionMessage::ResetInput { slot } => {
            tracing::debug!(slot = %slot, "File input cleared");
        }
        SessionMessage::CopyToClipboard { text } => match exporter.copy(&text).await {
            Ok(true) => {}
            Ok(false) => println!("--- Clipboard ---\n{text}"),
            Err(e) => {
                warn!(error = %e, "Clipboard command failed");
                eprintln!("{e:#}");
            }
        },
        SessionMessage::SaveFile {
            file_name,
            contents,
        } => match exporter.save(&file_name, &contents).await {
            Ok(path) => println!("Saved {}", path.display()),
            Err(e) => {
                warn!(error = %e, "Download failed");
                eprintln!("{e:#}");
            }
        },
    }
}

/// Deliver everything the conductor has queued so far
async fn drain(
    rx: &mut mpsc::Receiver<SessionMessage>,
    renderer: &mut Renderer,
    exporter: &Exporter,
) {
    while let Ok(msg) = rx.try_recv() {
        deliver(msg, renderer, exporter).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut config = match args.config.clone() {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .context("failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("invalid configuration")?;

    info!(
        backend = %config.backend.base_url,
        source = ?config.source(),
        "Starting replydesk"
    );

    let backend = HttpBackend::new(&config.backend).context("failed to build backend client")?;
    let exporter = Exporter::new(
        config.export.download_dir.clone(),
        config.export.clipboard_command.clone(),
    );
    info!(dir = %exporter.download_dir().display(), "Downloads enabled");

    let max_bytes = config.intake.max_file_bytes;
    let (tx, mut rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
    let mut conductor = Conductor::new(backend, ConductorConfig::from_file_config(&config), tx);
    let mut renderer = Renderer::new();

    conductor.start().await?;
    drain(&mut rx, &mut renderer, &exporter).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        if !run_line(&mut conductor, &line, max_bytes).await? {
                            break;
                        }
                    }
                    None => {
                        // End of scripted input: finish what was started
                        conductor.settle().await;
                        break;
                    }
                }
            }
            Some(done) = conductor.next_completion() => {
                conductor.apply_completion(done).await;
            }
        }
        drain(&mut rx, &mut renderer, &exporter).await;
    }

    drain(&mut rx, &mut renderer, &exporter).await;
    info!(session = %conductor.session_id().0, "replydesk exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replydesk_core::intake::{IntakePolicy, MAX_UPLOAD_BYTES};
    use replydesk_core::Slot;

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from([
            "replydesk",
            "--backend-url",
            "http://example.test:9000/",
            "-d",
            "/tmp/replies",
        ]);
        let overrides = args.overrides();
        assert_eq!(
            overrides.backend_url.as_deref(),
            Some("http://example.test:9000/")
        );
        assert_eq!(overrides.download_dir, Some(PathBuf::from("/tmp/replies")));
    }

    #[tokio::test]
    async fn test_read_selection_infers_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thread.eml");
        std::fs::write(&path, "From: a@example.test").unwrap();

        let selection = read_selection(&path, MAX_UPLOAD_BYTES).await.unwrap();
        assert_eq!(selection.name, "thread.eml");
        assert_eq!(selection.mime_type, "message/rfc822");
        assert_eq!(selection.content, b"From: a@example.test");
    }

    #[tokio::test]
    async fn test_read_selection_missing_file() {
        let err = read_selection(Path::new("/definitely/not/here.pdf"), MAX_UPLOAD_BYTES)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }

    #[tokio::test]
    async fn test_read_selection_stops_past_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        let selection = read_selection(&path, 100).await.unwrap();
        assert_eq!(selection.content.len(), 101);
        assert_eq!(selection.mime_type, "application/pdf");

        let err = IntakePolicy::with_max_bytes(100)
            .validate(Slot::Pdf, selection)
            .unwrap_err();
        assert_eq!(err.to_string(), "File too large (max 100 bytes).");
    }

    #[test]
    fn test_slots_have_upload_commands() {
        for slot in Slot::ALL {
            let line = format!("{} file", slot.label().to_ascii_lowercase());
            assert!(matches!(
                line.parse::<Command>(),
                Ok(Command::Upload { slot: s, .. }) if s == slot
            ));
        }
    }
}
