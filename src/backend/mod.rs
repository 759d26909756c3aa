//! Contract with the reasoning backend that turns audio plus field
//! descriptors into a fill mapping.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::AudioClip;
use crate::form::{FieldDescriptor, FillMapping};

pub use http::HttpBackend;

/// Message used when the backend reports failure without saying why.
pub const GENERIC_FAILURE: &str = "Backend processing failed";

#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Non-2xx status or `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// A 2xx response whose body could not be understood.
    #[error("Backend sent an unreadable response: {0}")]
    Malformed(String),
}

/// `form_data_json` part of the request.
#[derive(Debug, Serialize)]
pub struct FormDataPayload<'a> {
    pub fields: &'a [FieldDescriptor],
}

/// Body of a backend response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub form_data: FillMapping,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub transcribed_text: Option<String>,
}

impl BackendReply {
    /// The fill mapping, or the backend's own message when it reports
    /// failure.
    pub fn into_mapping(self) -> Result<FillMapping, BackendError> {
        if self.success {
            return Ok(self.form_data);
        }
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        Err(BackendError::Rejected(message))
    }
}

#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Send the clip and the extracted fields; receive field id → value.
    async fn process(
        &self,
        clip: &AudioClip,
        fields: &[FieldDescriptor],
    ) -> Result<FillMapping, BackendError>;
}
