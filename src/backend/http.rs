use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::backend::{BackendError, BackendReply, FormDataPayload, ReasoningBackend};
use crate::capture::AudioClip;
use crate::form::{FieldDescriptor, FillMapping};

/// Multipart HTTP client for the reasoning backend.
pub struct HttpBackend {
    client: reqwest::Client,
    process_url: String,
    health_url: String,
    audio_filename: String,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        process_path: &str,
        health_path: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        let base = base_url.trim_end_matches('/');

        Ok(Self {
            client,
            process_url: format!("{}{}", base, process_path),
            health_url: format!("{}{}", base, health_path),
            audio_filename: "recording.webm".to_string(),
        })
    }

    pub fn with_audio_filename(mut self, filename: &str) -> Self {
        self.audio_filename = filename.to_string();
        self
    }

    pub fn process_url(&self) -> &str {
        &self.process_url
    }

    /// Probe the backend health endpoint.
    pub async fn health(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        check_status(response.status())
    }

    fn build_form(&self, clip: &AudioClip, fields: &[FieldDescriptor]) -> Result<Form, BackendError> {
        let form_data_json = serde_json::to_string(&FormDataPayload { fields })
            .map_err(|e| BackendError::Malformed(format!("could not encode fields: {}", e)))?;

        let audio = Part::bytes(clip.bytes.clone())
            .file_name(self.audio_filename.clone())
            .mime_str(&clip.mime)
            .map_err(|e| BackendError::Malformed(format!("invalid audio type {}: {}", clip.mime, e)))?;

        Ok(Form::new()
            .part("audio_file", audio)
            .text("form_data_json", form_data_json))
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), BackendError> {
    if status.is_success() {
        return Ok(());
    }
    Err(BackendError::Rejected(format!(
        "Backend returned {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )))
}

#[async_trait]
impl ReasoningBackend for HttpBackend {
    async fn process(
        &self,
        clip: &AudioClip,
        fields: &[FieldDescriptor],
    ) -> Result<FillMapping, BackendError> {
        let form = self.build_form(clip, fields)?;

        info!(url = %self.process_url, fields = fields.len(), audio_bytes = clip.len(), "sending to backend");
        let response = self
            .client
            .post(&self.process_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        check_status(response.status())?;

        let reply: BackendReply = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        if let Some(text) = &reply.transcribed_text {
            debug!(transcript = %text, "backend transcript");
        }
        reply.into_mapping()
    }
}
