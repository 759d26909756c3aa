use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, broadcast};
use tracing::info;

use crate::backend::HttpBackend;
use crate::capture::{AudioCapture, FileCapture};
use crate::cli::config::AppConfig;
use crate::dom::load_document;
use crate::form::{FillMapping, FillReport, MatchOptions, extract_fields, fill_document};
use crate::page::browser::SharedBridge;
use crate::page::{BrowserBridge, BrowserCapture, BrowserPage, LocalPage, PageContext};
use crate::session::{Dwell, ProcessingMachine, StatusUpdate};
use crate::trace::TraceLogger;

// ============================================================================
// extract subcommand
// ============================================================================

pub fn cmd_extract(page: &Path) -> Result<()> {
    let doc = load_document(page)?;
    let fields = extract_fields(&doc);
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

pub fn cmd_fill(page: &Path, data: &str, output: Option<&Path>, options: &MatchOptions) -> Result<FillReport> {
    let mapping = parse_mapping(data)?;
    let mut doc = load_document(page)?;
    let report = fill_document(&mut doc, &mapping, options);

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = output {
        let snapshot = doc.to_snapshot().context("page has no root element")?;
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote filled page");
    }

    Ok(report)
}

/// Parse a mapping given inline or as `@path`.
pub fn parse_mapping(data: &str) -> Result<FillMapping> {
    let json = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?,
        None => data.to_string(),
    };
    serde_json::from_str(&json).context("fill data must be a JSON object of field id → value")
}

// ============================================================================
// process subcommand
// ============================================================================

pub fn build_backend(config: &AppConfig) -> Result<HttpBackend> {
    let backend = HttpBackend::new(
        &config.backend.url,
        &config.backend.process_path,
        &config.backend.health_path,
        config.backend.timeout(),
    )?;
    Ok(backend.with_audio_filename(&config.audio.filename))
}

fn file_capture(config: &AppConfig, path: &Path) -> Arc<dyn AudioCapture> {
    let capture = FileCapture::new(path);
    match &config.audio.mime {
        Some(mime) => Arc::new(capture.with_mime(mime)),
        None => Arc::new(capture),
    }
}

/// Run one session and print every status update. Returns whether it ended
/// in SUCCESS.
pub async fn cmd_process(
    config: &AppConfig,
    page: Option<&Path>,
    url: Option<&str>,
    audio: Option<&Path>,
    no_dwell: bool,
) -> Result<bool> {
    let options = config.fill.match_options();
    let mut bridge: Option<SharedBridge> = None;

    let (page, capture): (Arc<dyn PageContext>, Arc<dyn AudioCapture>) = match (page, url) {
        (Some(path), _) => {
            let audio = audio.context("--audio is required with --page")?;
            let page = LocalPage::open(path)?.with_options(options);
            (Arc::new(page) as Arc<dyn PageContext>, file_capture(config, audio))
        }
        (None, Some(url)) => {
            let mut launched = BrowserBridge::launch(&config.browser.command, &config.browser.script).await?;
            launched.navigate(url).await?;
            let shared = Arc::new(Mutex::new(launched));
            bridge = Some(shared.clone());

            let capture = match audio {
                Some(path) => file_capture(config, path),
                None => Arc::new(BrowserCapture::new(shared.clone())) as Arc<dyn AudioCapture>,
            };
            let page = BrowserPage::new(shared).with_options(options);
            (Arc::new(page) as Arc<dyn PageContext>, capture)
        }
        (None, None) => bail!("either --page or --url is required"),
    };

    let dwell = if no_dwell { Dwell::none() } else { config.dwell.to_dwell() };
    let tracer = match &config.trace.path {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };
    let machine = ProcessingMachine::builder(Arc::new(build_backend(config)?))
        .dwell(dwell)
        .tracer(tracer)
        .build();

    let printer = tokio::spawn(print_status_updates(machine.subscribe()));

    let recording = machine.start_recording(capture.as_ref()).await?;
    if bridge.is_some() && audio.is_none() {
        eprintln!("Recording... press Enter to stop.");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    }

    let result = machine.stop_recording(recording, capture, page).await?;
    printer.await?;

    if let Some(bridge) = bridge {
        bridge.lock().await.quit().await?;
    }

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome.report)?);
            println!(
                "Filled {} of {} fields via {}",
                outcome.report.filled_count(),
                outcome.fields.len(),
                outcome.write_path.as_str()
            );
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

/// Print updates until the session reaches SUCCESS or ERROR.
async fn print_status_updates(mut updates: broadcast::Receiver<StatusUpdate>) {
    loop {
        match updates.recv().await {
            Ok(update) => {
                let state = update.state;
                if !state.message.is_empty() {
                    println!("[{}] {}", state.step, state.message);
                }
                if state.step.is_terminal() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// ============================================================================
// health subcommand
// ============================================================================

pub async fn cmd_health(config: &AppConfig) -> Result<()> {
    let backend = build_backend(config)?;
    backend
        .health()
        .await
        .with_context(|| format!("backend at {} is not healthy", config.backend.url))?;
    println!("Backend at {} is healthy", config.backend.url);
    Ok(())
}
