use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex;
use tracing::info;

use crate::capture::{AudioCapture, AudioClip, CaptureError, CaptureHandle};
use crate::form::{
    FieldDescriptor, FillMapping, FillReport, MatchOptions, extract_fields, fill_document, inject_fill,
};
use crate::page::bridge::commit_ops;
use crate::page::{BrowserBridge, PageContext, PageError};

pub type SharedBridge = Arc<Mutex<BrowserBridge>>;

/// The active tab of a bridged browser.
///
/// Every operation takes a fresh snapshot, runs the form engine against it,
/// then replays the recorded writes in the live page.
pub struct BrowserPage {
    bridge: SharedBridge,
    options: MatchOptions,
}

impl BrowserPage {
    pub fn new(bridge: SharedBridge) -> Self {
        Self {
            bridge,
            options: MatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl PageContext for BrowserPage {
    fn describe(&self) -> String {
        match self.bridge.try_lock() {
            Ok(bridge) => bridge.last_url().unwrap_or("about:blank").to_string(),
            Err(_) => "browser tab".to_string(),
        }
    }

    async fn extract_fields(&self) -> Result<Vec<FieldDescriptor>, PageError> {
        let doc = self.bridge.lock().await.snapshot().await?;
        Ok(extract_fields(&doc))
    }

    async fn fill_fields(&self, mapping: &FillMapping) -> Result<FillReport, PageError> {
        let mut bridge = self.bridge.lock().await;
        let mut doc = bridge.snapshot().await?;
        let report = fill_document(&mut doc, mapping, &self.options);
        let ops = commit_ops(&doc);
        info!(ops = ops.len(), filled = report.filled_count(), "committing fill");
        bridge.commit(&ops).await?;
        Ok(report)
    }

    fn supports_injection(&self) -> bool {
        true
    }

    async fn inject_fill(&self, mapping: &FillMapping) -> Result<FillReport, PageError> {
        let mut bridge = self.bridge.lock().await;
        let mut doc = bridge.snapshot().await?;
        let report = inject_fill(&mut doc, mapping);
        let ops = commit_ops(&doc);
        info!(ops = ops.len(), filled = report.filled_count(), "committing direct fill");
        bridge.commit(&ops).await?;
        Ok(report)
    }
}

/// Microphone capture through the bridged page.
pub struct BrowserCapture {
    bridge: SharedBridge,
    active: SyncMutex<Option<u64>>,
    next_id: AtomicU64,
}

impl BrowserCapture {
    pub fn new(bridge: SharedBridge) -> Self {
        Self {
            bridge,
            active: SyncMutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl AudioCapture for BrowserCapture {
    async fn start_capture(&self) -> Result<CaptureHandle, CaptureError> {
        self.bridge
            .lock()
            .await
            .start_recording()
            .await
            .map_err(|e| CaptureError::Start(e.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *self.active.lock() = Some(id);
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

        let url = self
            .bridge
            .lock()
            .await
            .stop_recording()
            .await
            .map_err(|_| CaptureError::Unavailable)?;
        AudioClip::from_data_url(&url)
    }
}
