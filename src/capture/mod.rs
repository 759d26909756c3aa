//! Contract with the audio-capture collaborator.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use parking_lot::Mutex;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No active recording")]
    Unavailable,

    #[error("Could not start recording: {0}")]
    Start(String),

    #[error("Could not decode recorded audio: {0}")]
    Decode(String),

    #[error("Could not read recorded audio from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Token for one running capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHandle {
    pub id: u64,
}

/// An encoded audio clip. Opaque to everything but the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime: &str) -> Self {
        Self {
            bytes,
            mime: mime.to_string(),
        }
    }

    /// Decode a `data:` URL as produced by a browser `FileReader`, e.g.
    /// `data:audio/webm;codecs=opus;base64,GkXf...`.
    pub fn from_data_url(url: &str) -> Result<Self, CaptureError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| CaptureError::Decode("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CaptureError::Decode("data URL has no payload".into()))?;

        let mime = header
            .split(';')
            .next()
            .filter(|m| !m.is_empty())
            .unwrap_or("application/octet-stream");

        let bytes = if header.ends_with(";base64") {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| CaptureError::Decode(e.to_string()))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self::new(bytes, mime))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-1 of the clip, for traces that must not carry the audio itself.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
pub trait AudioCapture: Send + Sync {
    async fn start_capture(&self) -> Result<CaptureHandle, CaptureError>;

    /// Stop the capture identified by `handle` and hand over the clip.
    /// Fails with [`CaptureError::Unavailable`] if it is not running.
    async fn stop_capture(&self, handle: CaptureHandle) -> Result<AudioClip, CaptureError>;
}

/// Capture that "records" a clip already on disk. Used by the CLI to drive
/// a session from a pre-recorded utterance.
pub struct FileCapture {
    path: PathBuf,
    mime: Option<String>,
    active: Mutex<Option<u64>>,
    next_id: AtomicU64,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime: None,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Override the content type guessed from the file extension.
    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime = Some(mime.to_string());
        self
    }

    fn mime(&self) -> &str {
        if let Some(mime) = &self.mime {
            return mime;
        }
        match self.path.extension().and_then(|e| e.to_str()) {
            Some("webm") => "audio/webm",
            Some("wav") => "audio/wav",
            Some("ogg") => "audio/ogg",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            _ => "application/octet-stream",
        }
    }
}

#[async_trait]
impl AudioCapture for FileCapture {
    async fn start_capture(&self) -> Result<CaptureHandle, CaptureError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *self.active.lock() = Some(id);
        info!(path = %self.path.display(), "recording from file");
        Ok(CaptureHandle { id })
    }

    async fn stop_capture(&self, handle: CaptureHandle) -> Result<AudioClip, CaptureError> {
        {
            let mut active = self.active.lock();
            if *active != Some(handle.id) {
                return Err(CaptureError::Unavailable);
            }
            *active = None;
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CaptureError::Read {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(AudioClip::new(bytes, self.mime()))
    }
}
