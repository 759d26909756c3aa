use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use voice_form_fill::backend::{BackendError, ReasoningBackend};
use voice_form_fill::capture::{AudioCapture, AudioClip, CaptureError, CaptureHandle};
use voice_form_fill::form::{FieldDescriptor, FillMapping, FillReport};
use voice_form_fill::page::{LocalPage, PageContext, PageError};

// ============================================================================
// Backend
// ============================================================================

pub enum Reply {
    Mapping(FillMapping),
    Rejected(String),
    Unreachable,
}

pub struct MockBackend {
    reply: Reply,
    calls: Mutex<Vec<Vec<FieldDescriptor>>>,
}

impl MockBackend {
    pub fn replying(mapping: FillMapping) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Mapping(mapping),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Rejected(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Unreachable,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_fields(&self) -> Vec<FieldDescriptor> {
        self.calls.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningBackend for MockBackend {
    async fn process(
        &self,
        _clip: &AudioClip,
        fields: &[FieldDescriptor],
    ) -> Result<FillMapping, BackendError> {
        self.calls.lock().push(fields.to_vec());
        match &self.reply {
            Reply::Mapping(mapping) => Ok(mapping.clone()),
            Reply::Rejected(message) => Err(BackendError::Rejected(message.clone())),
            Reply::Unreachable => Err(BackendError::Unreachable("connection refused".into())),
        }
    }
}

// ============================================================================
// Capture
// ============================================================================

pub struct MemoryCapture {
    clip: AudioClip,
    lose_recording: bool,
    active: Mutex<Option<u64>>,
    next_id: AtomicU64,
}

impl MemoryCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clip: sample_clip(),
            lose_recording: false,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    /// A capture whose recording is gone by the time it is stopped.
    pub fn losing_recording() -> Arc<Self> {
        Arc::new(Self {
            clip: sample_clip(),
            lose_recording: true,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl AudioCapture for MemoryCapture {
    async fn start_capture(&self) -> Result<CaptureHandle, CaptureError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if !self.lose_recording {
            *self.active.lock() = Some(id);
        }
        Ok(CaptureHandle { id })
    }

    async fn stop_capture(&self, handle: CaptureHandle) -> Result<AudioClip, CaptureError> {
        let mut active = self.active.lock();
        if *active != Some(handle.id) {
            return Err(CaptureError::Unavailable);
        }
        *active = None;
        Ok(self.clip.clone())
    }
}

pub fn sample_clip() -> AudioClip {
    AudioClip::new(b"\x1a\x45\xdf\xa3 fake webm".to_vec(), "audio/webm")
}

// ============================================================================
// Pages
// ============================================================================

/// A page whose message channel is down. Direct injection still works
/// unless `allow_injection` is false.
pub struct ChannelDownPage {
    pub inner: LocalPage,
    pub allow_injection: bool,
}

#[async_trait]
impl PageContext for ChannelDownPage {
    fn describe(&self) -> String {
        self.inner.describe()
    }

    async fn extract_fields(&self) -> Result<Vec<FieldDescriptor>, PageError> {
        self.inner.extract_fields().await
    }

    async fn fill_fields(&self, _mapping: &FillMapping) -> Result<FillReport, PageError> {
        Err(PageError::ChannelUnavailable("Receiving end does not exist".into()))
    }

    fn supports_injection(&self) -> bool {
        self.allow_injection
    }

    async fn inject_fill(&self, mapping: &FillMapping) -> Result<FillReport, PageError> {
        self.inner.inject_fill(mapping).await
    }
}

/// A page whose field extraction panics partway through a session.
pub struct PanickingPage;

#[async_trait]
impl PageContext for PanickingPage {
    fn describe(&self) -> String {
        "panicking page".into()
    }

    async fn extract_fields(&self) -> Result<Vec<FieldDescriptor>, PageError> {
        panic!("content script crashed")
    }

    async fn fill_fields(&self, _mapping: &FillMapping) -> Result<FillReport, PageError> {
        unreachable!("extraction never returns")
    }
}
