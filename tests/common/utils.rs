use std::path::PathBuf;

use voice_form_fill::dom::{Document, NodeId, load_document, parse_html};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_fixture(name: &str) -> Document {
    load_document(&fixture(name)).expect("fixture loads")
}

/// Parse a fragment wrapped in a bare page.
pub fn page_with(body: &str) -> Document {
    parse_html(&format!("<!DOCTYPE html><html><body>{}</body></html>", body))
}

pub fn control(doc: &Document, dom_id: &str) -> NodeId {
    doc.element_by_id(dom_id)
        .unwrap_or_else(|| panic!("no element with id {}", dom_id))
}
