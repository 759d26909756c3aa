//! Pages the engine can extract from and write into.

pub mod bridge;
pub mod browser;
pub mod local;
pub mod write;

use async_trait::async_trait;
use thiserror::Error;

use crate::form::{FieldDescriptor, FillMapping, FillReport};

pub use bridge::BrowserBridge;
pub use browser::{BrowserCapture, BrowserPage};
pub use local::LocalPage;
pub use write::{
    DirectInjectionWrite, MessageChannelWrite, WritePath, WriteStrategy, default_strategies,
    write_with_fallback,
};

#[derive(Debug, Error)]
pub enum PageError {
    /// The page could not be messaged (closed tab, missing listener, dead
    /// bridge process).
    #[error("page channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// Direct injection is not possible for this page.
    #[error("page does not support direct injection")]
    InjectionUnsupported,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bridge I/O error: {0}")]
    Io(String),

    #[error("bridge command '{command}' failed: {error}")]
    Protocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One page that can describe its form and receive a fill.
#[async_trait]
pub trait PageContext: Send + Sync {
    /// Human-readable page identity for logs.
    fn describe(&self) -> String;

    async fn extract_fields(&self) -> Result<Vec<FieldDescriptor>, PageError>;

    /// Fill through the page's regular message channel, running the full
    /// fill engine.
    async fn fill_fields(&self, mapping: &FillMapping) -> Result<FillReport, PageError>;

    fn supports_injection(&self) -> bool {
        false
    }

    /// Fill by injecting the minimal fill logic straight into the page.
    async fn inject_fill(&self, _mapping: &FillMapping) -> Result<FillReport, PageError> {
        Err(PageError::InjectionUnsupported)
    }
}
