use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::form::{FillMapping, FillReport};
use crate::page::{PageContext, PageError};

/// Which mechanism actually delivered the fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePath {
    MessageChannel,
    DirectInjection,
}

impl WritePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritePath::MessageChannel => "message_channel",
            WritePath::DirectInjection => "direct_injection",
        }
    }
}

#[async_trait]
pub trait WriteStrategy: Send + Sync {
    fn path(&self) -> WritePath;

    async fn write(&self, page: &dyn PageContext, mapping: &FillMapping) -> Result<FillReport, PageError>;
}

/// Primary path: message the page and let it run the full fill engine.
pub struct MessageChannelWrite;

#[async_trait]
impl WriteStrategy for MessageChannelWrite {
    fn path(&self) -> WritePath {
        WritePath::MessageChannel
    }

    async fn write(&self, page: &dyn PageContext, mapping: &FillMapping) -> Result<FillReport, PageError> {
        page.fill_fields(mapping).await
    }
}

/// Fallback path: inject a minimal id/name fill straight into the page.
pub struct DirectInjectionWrite;

#[async_trait]
impl WriteStrategy for DirectInjectionWrite {
    fn path(&self) -> WritePath {
        WritePath::DirectInjection
    }

    async fn write(&self, page: &dyn PageContext, mapping: &FillMapping) -> Result<FillReport, PageError> {
        if !page.supports_injection() {
            return Err(PageError::InjectionUnsupported);
        }
        page.inject_fill(mapping).await
    }
}

pub fn default_strategies() -> Vec<Box<dyn WriteStrategy>> {
    vec![Box::new(MessageChannelWrite), Box::new(DirectInjectionWrite)]
}

/// Try each strategy in order; the first success wins. The error of the
/// last strategy is returned when all fail.
pub async fn write_with_fallback(
    page: &dyn PageContext,
    mapping: &FillMapping,
    strategies: &[Box<dyn WriteStrategy>],
) -> Result<(WritePath, FillReport), PageError> {
    let mut last_error = PageError::ChannelUnavailable("no write strategy configured".into());

    for strategy in strategies {
        let path = strategy.path();
        match strategy.write(page, mapping).await {
            Ok(report) => {
                info!(path = path.as_str(), filled = report.filled_count(), "fill delivered");
                return Ok((path, report));
            }
            Err(e) => {
                warn!(path = path.as_str(), error = %e, "write path failed");
                last_error = e;
            }
        }
    }

    Err(last_error)
}
