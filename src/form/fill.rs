use serde::Serialize;
use tracing::{debug, warn};

use crate::dom::{Document, EventKind, NodeId};
use crate::form::field_model::FillMapping;
use crate::form::matcher::{Applied, MatchOptions, MutationKind, apply_value};

/// Attributes tried, after the element id, to find the control a backend
/// field id refers to.
pub const LOOKUP_ATTRIBUTES: &[&str] = &[
    "name",
    "data-testid",
    "data-field",
    "data-automation-id",
    "aria-labelledby",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledField {
    pub field_id: String,
    pub kind: MutationKind,
}

/// What happened to each instruction of one fill batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    /// Instructions that changed a control.
    pub filled: Vec<FilledField>,
    /// Instructions whose value carried no information.
    pub skipped: Vec<String>,
    /// Instructions whose field id matched no control.
    pub unresolved: Vec<String>,
    /// Instructions that found a control but no safe change to make.
    pub unchanged: Vec<String>,
    /// Field the page was scrolled to.
    pub scrolled_to: Option<String>,
}

impl FillReport {
    pub fn filled_count(&self) -> usize {
        self.filled.len()
    }
}

/// Find the live control a field id refers to: element id, then the lookup
/// attributes, then a class name.
pub fn resolve_control(doc: &Document, field_id: &str) -> Option<NodeId> {
    if field_id.is_empty() {
        return None;
    }
    doc.element_by_id(field_id)
        .or_else(|| {
            LOOKUP_ATTRIBUTES.iter().find_map(|attr| {
                doc.first_element(|d, n| d.attr(n, attr) == Some(field_id))
            })
        })
        .or_else(|| doc.first_element(|d, n| d.has_class(n, field_id)))
}

/// Events a framework needs to see after a mutation of `kind`.
pub fn notifications(kind: MutationKind) -> &'static [EventKind] {
    match kind {
        MutationKind::Text => &[EventKind::Input, EventKind::Change, EventKind::Blur],
        MutationKind::Select => &[EventKind::Change, EventKind::Input],
        MutationKind::Toggle => &[EventKind::Click, EventKind::Change],
    }
}

fn notify(doc: &mut Document, applied: Applied) {
    for event in notifications(applied.kind) {
        doc.dispatch(applied.target, *event);
    }
}

/// Apply a backend mapping to the document.
///
/// Best effort: an instruction that cannot be applied is recorded in the
/// report and the batch carries on. Only the first resolved control is
/// scrolled into view.
pub fn fill_document(doc: &mut Document, mapping: &FillMapping, options: &MatchOptions) -> FillReport {
    let mut report = FillReport::default();

    for instruction in mapping.iter() {
        let field_id = instruction.field_id.as_str();

        let Some(value) = instruction.value.as_text() else {
            debug!(field_id, "skipping empty value");
            report.skipped.push(field_id.to_string());
            continue;
        };

        let Some(control) = resolve_control(doc, field_id) else {
            warn!(field_id, "field not found");
            report.unresolved.push(field_id.to_string());
            continue;
        };

        if report.scrolled_to.is_none() {
            doc.scroll_into_view(control);
            report.scrolled_to = Some(field_id.to_string());
        }

        match apply_value(doc, control, &value, options) {
            Some(applied) => {
                notify(doc, applied);
                debug!(field_id, %value, "filled field");
                report.filled.push(FilledField {
                    field_id: field_id.to_string(),
                    kind: applied.kind,
                });
            }
            None => report.unchanged.push(field_id.to_string()),
        }
    }

    report
}

/// Minimal fill used when the page cannot be messaged and the logic has to
/// be injected directly: id or name lookup, native setter (plain assignment
/// for selects), then input and change.
pub fn inject_fill(doc: &mut Document, mapping: &FillMapping) -> FillReport {
    let mut report = FillReport::default();

    for instruction in mapping.iter() {
        let field_id = instruction.field_id.as_str();

        let Some(value) = instruction.value.as_text() else {
            report.skipped.push(field_id.to_string());
            continue;
        };

        let control = doc
            .element_by_id(field_id)
            .or_else(|| doc.first_element(|d, n| d.attr(n, "name") == Some(field_id)));
        let Some(control) = control else {
            warn!(field_id, "field not found during direct fill");
            report.unresolved.push(field_id.to_string());
            continue;
        };

        let kind = if doc.tag(control) == "select" {
            doc.set_value_property(control, &value);
            MutationKind::Select
        } else {
            doc.set_value_native(control, &value);
            MutationKind::Text
        };
        doc.dispatch(control, EventKind::Input);
        doc.dispatch(control, EventKind::Change);

        report.filled.push(FilledField {
            field_id: field_id.to_string(),
            kind,
        });
    }

    report
}
