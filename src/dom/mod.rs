//! In-process DOM model the form engine reads and writes.

pub mod document;
pub mod html;
pub mod snapshot;

use std::path::Path;

use thiserror::Error;

pub use document::{Document, Element, EventKind, Mutation, NodeData, NodeId, Render, SetterPath};
pub use html::parse_html;
pub use snapshot::{SnapshotElement, SnapshotNode};

#[derive(Debug, Error)]
pub enum DomError {
    #[error("failed to read page {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Document {
    pub fn from_json(json: &str) -> Result<Document, DomError> {
        let root: SnapshotNode =
            serde_json::from_str(json).map_err(|source| DomError::JsonParse {
                context: "DOM snapshot".into(),
                source,
            })?;
        Ok(Document::from_snapshot(&root))
    }
}

/// Load a page from disk: `.json` files are snapshots, anything else is
/// parsed as HTML.
pub fn load_document(path: &Path) -> Result<Document, DomError> {
    let content = std::fs::read_to_string(path).map_err(|source| DomError::Read {
        path: path.display().to_string(),
        source,
    })?;

    if path.extension().is_some_and(|e| e == "json") {
        Document::from_json(&content)
    } else {
        Ok(parse_html(&content))
    }
}
