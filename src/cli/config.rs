use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::form::{DateOrder, MatchOptions};
use crate::session::Dwell;

pub const DEFAULT_CONFIG_FILE: &str = "voice-form-fill.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "voice-form-fill",
    version,
    about = "Fill web forms from a spoken description"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: voice-form-fill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Reasoning backend base URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the field descriptors of a page as JSON
    Extract {
        /// HTML file or JSON DOM snapshot
        #[arg(long)]
        page: PathBuf,
    },

    /// Apply a field id → value mapping to a page and print the fill report
    Fill {
        /// HTML file or JSON DOM snapshot
        #[arg(long)]
        page: PathBuf,

        /// JSON object of field id → value, or @path to a JSON file
        #[arg(long)]
        data: String,

        /// Write the filled page as a JSON snapshot to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run one full session: capture, extract, ask the backend, fill
    Process {
        /// HTML file or JSON DOM snapshot to fill
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        page: Option<PathBuf>,

        /// Open this URL in the bridged browser and fill it there
        #[arg(long)]
        url: Option<String>,

        /// Pre-recorded audio clip (required unless recording in the browser)
        #[arg(long, required_unless_present = "url")]
        audio: Option<PathBuf>,

        /// Skip the pauses between steps
        #[arg(long)]
        no_dwell: bool,
    },

    /// Check that the reasoning backend is up
    Health,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `voice-form-fill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub dwell: DwellConfig,
    #[serde(default)]
    pub fill: FillConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,

    #[serde(default = "default_process_path")]
    pub process_path: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            process_path: default_process_path(),
            health_path: default_health_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwellConfig {
    #[serde(default = "default_analyzing_ms")]
    pub analyzing_ms: u64,
    #[serde(default = "default_crawling_ms")]
    pub crawling_ms: u64,
    #[serde(default = "default_brain_ms")]
    pub brain_ms: u64,
    #[serde(default = "default_filling_ms")]
    pub filling_ms: u64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            analyzing_ms: default_analyzing_ms(),
            crawling_ms: default_crawling_ms(),
            brain_ms: default_brain_ms(),
            filling_ms: default_filling_ms(),
        }
    }
}

impl DwellConfig {
    pub fn to_dwell(&self) -> Dwell {
        Dwell::from_millis(self.analyzing_ms, self.crawling_ms, self.brain_ms, self.filling_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default)]
    pub date_order: DateOrder,
}

impl FillConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            date_order: self.date_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// File name the clip is uploaded under.
    #[serde(default = "default_audio_filename")]
    pub filename: String,

    /// Content type to send instead of the one guessed from the file.
    pub mime: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            filename: default_audio_filename(),
            mime: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// JSONL file receiving one line per state transition; `null` disables.
    #[serde(default = "default_trace_path")]
    pub path: Option<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            path: default_trace_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_browser_command")]
    pub command: String,

    #[serde(default = "default_browser_script")]
    pub script: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            command: default_browser_command(),
            script: default_browser_script(),
        }
    }
}

// Serde default helpers
fn default_backend_url() -> String { "http://localhost:8000".to_string() }
fn default_process_path() -> String { "/api/process".to_string() }
fn default_health_path() -> String { "/health".to_string() }
fn default_timeout_secs() -> u64 { 120 }
fn default_analyzing_ms() -> u64 { 1500 }
fn default_crawling_ms() -> u64 { 2000 }
fn default_brain_ms() -> u64 { 2500 }
fn default_filling_ms() -> u64 { 2000 }
fn default_audio_filename() -> String { "recording.webm".to_string() }
fn default_trace_path() -> Option<String> { Some("session_trace.jsonl".to_string()) }
fn default_browser_command() -> String { "node".to_string() }
fn default_browser_script() -> String { "bridge/browser_bridge.js".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = config_path, error = %e, "ignoring malformed config");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Fold CLI overrides into the loaded config (CLI > config > defaults).
pub fn resolve_config(cli: &Cli, mut config: AppConfig) -> AppConfig {
    if let Some(url) = &cli.backend_url {
        config.backend.url = url.clone();
    }
    config
}
