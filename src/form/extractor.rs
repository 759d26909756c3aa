use std::collections::HashSet;

use tracing::{debug, trace};

use crate::dom::{Document, NodeId};
use crate::form::field_model::{FieldDescriptor, FieldKind, SelectOption};
use crate::form::label::resolve_label;

/// Input types that never take a value from the user.
pub const SKIPPED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// Classes of native controls that a widget library hides visually while
/// keeping them as the accessible source of truth (e.g. Select2).
pub const COMPOUND_WIDGET_CLASSES: &[&str] = &["select2-hidden-accessible"];

/// Attributes consulted, in order, for a control's identifier.
pub const ID_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "data-testid",
    "data-field",
    "data-automation-id",
    "aria-labelledby",
];

/// Every input/select/textarea in document order.
pub fn form_controls(doc: &Document) -> Vec<NodeId> {
    doc.find_all(|d, n| matches!(d.tag(n), "input" | "select" | "textarea"))
}

pub fn is_compound_widget(doc: &Document, control: NodeId) -> bool {
    COMPOUND_WIDGET_CLASSES
        .iter()
        .any(|class| doc.has_class(control, class))
}

/// Identifier for a control, falling back to its position among all
/// enumerated controls.
pub fn field_id(doc: &Document, control: NodeId, index: usize) -> String {
    ID_ATTRIBUTES
        .iter()
        .find_map(|attr| doc.non_empty_attr(control, attr))
        .map(str::to_string)
        .unwrap_or_else(|| format!("field_{}", index))
}

fn field_name(doc: &Document, control: NodeId, id: &str) -> String {
    ["name", "id", "data-testid"]
        .iter()
        .find_map(|attr| doc.non_empty_attr(control, attr))
        .unwrap_or(id)
        .to_string()
}

fn select_options(doc: &Document, select: NodeId) -> Vec<SelectOption> {
    doc.options(select)
        .into_iter()
        .map(|o| SelectOption {
            value: doc.option_value(o),
            text: doc.option_text(o),
        })
        .filter(|o| !o.value.is_empty())
        .collect()
}

fn current_value(doc: &Document, control: NodeId) -> String {
    if doc.is_toggle(control) {
        if doc.checked(control) { "checked" } else { "unchecked" }.to_string()
    } else {
        doc.value(control)
    }
}

/// Describe every fillable control in `doc`.
///
/// Pure with respect to the document: running it twice on an unchanged
/// document yields the same sequence. Identifiers are unique; the first
/// control to claim an identifier wins.
pub fn extract_fields(doc: &Document) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, control) in form_controls(doc).into_iter().enumerate() {
        let input_type = doc.input_type(control);
        if SKIPPED_INPUT_TYPES.contains(&input_type.as_str()) {
            trace!(index, %input_type, "skipping non-interactive control");
            continue;
        }

        let compound = is_compound_widget(doc, control);
        if !compound && !doc.is_rendered(control) {
            trace!(index, "skipping hidden control");
            continue;
        }

        let id = field_id(doc, control, index);
        if !seen.insert(id.clone()) {
            debug!(%id, "duplicate field id, keeping first occurrence");
            continue;
        }

        let tag = doc.tag(control).to_string();
        let kind = FieldKind::from_control(&tag, &input_type);
        let options = if kind == FieldKind::Select {
            select_options(doc, control)
        } else {
            Vec::new()
        };

        fields.push(FieldDescriptor {
            name: field_name(doc, control, &id),
            label: resolve_label(doc, control),
            placeholder: doc.attr(control, "placeholder").unwrap_or("").to_string(),
            current_value: current_value(doc, control),
            tag_name: tag,
            is_select2: compound,
            id,
            kind,
            options,
        });
    }

    debug!(count = fields.len(), "extracted form fields");
    fields
}
