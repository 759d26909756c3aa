use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of the session trace: a single state transition.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub session: u64,
    pub step: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_sha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_path: Option<String>,
}

impl TraceEvent {
    pub fn now(session: u64, step: &str, message: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            session,
            step: step.to_string(),
            message: message.to_string(),
            page: None,
            fields: None,
            filled: None,
            audio_sha1: None,
            write_path: None,
        }
    }

    pub fn with_page(mut self, page: impl ToString) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn with_fields(mut self, count: usize) -> Self {
        self.fields = Some(count);
        self
    }

    pub fn with_filled(mut self, count: usize) -> Self {
        self.filled = Some(count);
        self
    }

    pub fn with_audio_sha1(mut self, sha1: impl ToString) -> Self {
        self.audio_sha1 = Some(sha1.to_string());
        self
    }

    pub fn with_write_path(mut self, path: impl ToString) -> Self {
        self.write_path = Some(path.to_string());
        self
    }
}
