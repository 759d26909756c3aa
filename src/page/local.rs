use std::path::Path;

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};

use crate::dom::{Document, DomError, load_document};
use crate::form::{
    FieldDescriptor, FillMapping, FillReport, MatchOptions, extract_fields, fill_document, inject_fill,
};
use crate::page::{PageContext, PageError};

/// A page held in-process. Extraction and fills run directly against the
/// owned document.
pub struct LocalPage {
    name: String,
    document: Mutex<Document>,
    options: MatchOptions,
}

impl LocalPage {
    pub fn new(name: &str, document: Document) -> Self {
        Self {
            name: name.to_string(),
            document: Mutex::new(document),
            options: MatchOptions::default(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DomError> {
        let document = load_document(path)?;
        Ok(Self::new(&path.display().to_string(), document))
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Lock the live document.
    pub fn document(&self) -> MutexGuard<'_, Document> {
        self.document.lock()
    }
}

#[async_trait]
impl PageContext for LocalPage {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn extract_fields(&self) -> Result<Vec<FieldDescriptor>, PageError> {
        Ok(extract_fields(&self.document.lock()))
    }

    async fn fill_fields(&self, mapping: &FillMapping) -> Result<FillReport, PageError> {
        Ok(fill_document(&mut self.document.lock(), mapping, &self.options))
    }

    fn supports_injection(&self) -> bool {
        true
    }

    async fn inject_fill(&self, mapping: &FillMapping) -> Result<FillReport, PageError> {
        Ok(inject_fill(&mut self.document.lock(), mapping))
    }
}
