use serde::Serialize;
use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::form::field_model::is_blank;
use crate::form::normalize::{DateOrder, normalize_date, normalize_time};

pub const TRUE_TOKENS: &[&str] = &["yes", "true", "1", "on"];
pub const FALSE_TOKENS: &[&str] = &["no", "false", "0", "off"];

/// Classes too generic to identify a checkbox/radio group.
pub const GENERIC_TOGGLE_CLASSES: &[&str] = &["option-input", "radio", "checkbox"];

/// How a control was changed, which decides the notifications it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Text,
    Select,
    Toggle,
}

/// The control the matcher actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub target: NodeId,
    pub kind: MutationKind,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub date_order: DateOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
    Literal,
}

fn classify_toggle(value: &str) -> Toggle {
    if TRUE_TOKENS.contains(&value) {
        Toggle::On
    } else if FALSE_TOKENS.contains(&value) {
        Toggle::Off
    } else {
        Toggle::Literal
    }
}

/// Apply `value` to `control` (or the group it belongs to).
///
/// Returns the control that was mutated, or `None` when no safe target was
/// found or nothing changed.
pub fn apply_value(
    doc: &mut Document,
    control: NodeId,
    value: &str,
    options: &MatchOptions,
) -> Option<Applied> {
    if is_blank(value) {
        return None;
    }

    if doc.tag(control) == "select" {
        apply_select(doc, control, value)
    } else if doc.is_toggle(control) {
        apply_toggle(doc, control, value)
    } else {
        Some(apply_text(doc, control, value, options))
    }
}

// ============================================================================
// Select
// ============================================================================

/// Option to pick for `value`: exact value, then exact text, then the first
/// option whose text contains it. Case-insensitive.
pub fn match_option(doc: &Document, select: NodeId, value: &str) -> Option<NodeId> {
    let wanted = value.to_lowercase();
    let options = doc.options(select);

    options
        .iter()
        .find(|o| doc.option_value(**o).to_lowercase() == wanted)
        .or_else(|| {
            options
                .iter()
                .find(|o| doc.option_text(**o).to_lowercase() == wanted)
        })
        .or_else(|| {
            options
                .iter()
                .find(|o| doc.option_text(**o).to_lowercase().contains(&wanted))
        })
        .copied()
}

fn apply_select(doc: &mut Document, select: NodeId, value: &str) -> Option<Applied> {
    let Some(option) = match_option(doc, select, value) else {
        debug!(value, "no option matches");
        return None;
    };
    doc.select_option(select, option);
    Some(Applied {
        target: select,
        kind: MutationKind::Select,
    })
}

// ============================================================================
// Checkbox / radio
// ============================================================================

/// Members of the group `control` belongs to: inputs sharing its name, or
/// failing that, elements sharing its first distinctive class. Empty when
/// the control stands alone.
pub fn toggle_group(doc: &Document, control: NodeId) -> Vec<NodeId> {
    if let Some(name) = doc.non_empty_attr(control, "name") {
        let group = doc.find_all(|d, n| d.tag(n) == "input" && d.attr(n, "name") == Some(name));
        if group.len() > 1 {
            return group;
        }
    }

    for class in doc.classes(control) {
        if GENERIC_TOGGLE_CLASSES.contains(&class) {
            continue;
        }
        let group = doc.find_all(|d, n| d.has_class(n, class));
        if group.len() > 1 {
            return group;
        }
    }

    Vec::new()
}

/// Lowercased label of a group member: `label[for]`, a following label, or
/// the wrapping label's full text.
fn member_label(doc: &Document, member: NodeId) -> String {
    let by_for = doc.non_empty_attr(member, "id").and_then(|id| {
        doc.first_element(|d, n| d.tag(n) == "label" && d.attr(n, "for") == Some(id))
    });
    let by_sibling = || {
        doc.next_element_sibling(member)
            .filter(|n| doc.tag(*n) == "label")
    };
    let by_parent = || doc.parent(member).filter(|n| doc.tag(*n) == "label");

    [by_for, by_sibling(), by_parent()]
        .into_iter()
        .flatten()
        .map(|n| doc.text_content(n).trim().to_lowercase())
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Group member matching `wanted` by value attribute first, then by exact
/// label, then by a label containing it.
fn find_member(doc: &Document, group: &[NodeId], wanted: &str) -> Option<NodeId> {
    if let Some(member) = group
        .iter()
        .find(|m| doc.attr(**m, "value").unwrap_or("on").to_lowercase() == wanted)
    {
        return Some(*member);
    }

    let labels: Vec<(NodeId, String)> = group
        .iter()
        .map(|m| (*m, member_label(doc, *m)))
        .filter(|(_, label)| !label.is_empty())
        .collect();
    labels
        .iter()
        .find(|(_, label)| label == wanted)
        .or_else(|| labels.iter().find(|(_, label)| label.contains(wanted)))
        .map(|(member, _)| *member)
}

fn apply_toggle(doc: &mut Document, control: NodeId, value: &str) -> Option<Applied> {
    let wanted = value.trim().to_lowercase();
    let toggle = classify_toggle(&wanted);

    let group = toggle_group(doc, control);
    let matched = if group.len() > 1 {
        find_member(doc, &group, &wanted)
    } else {
        None
    };
    let target = matched.unwrap_or(control);

    let changed = if toggle == Toggle::On || matched.is_some() {
        if doc.checked(target) {
            false
        } else {
            doc.set_checked(target, true);
            true
        }
    } else if toggle == Toggle::Off && doc.checked(target) {
        doc.set_checked(target, false);
        true
    } else {
        false
    };

    if !changed {
        debug!(value, "checked state unchanged");
    }

    changed.then_some(Applied {
        target,
        kind: MutationKind::Toggle,
    })
}

// ============================================================================
// Text-like controls
// ============================================================================

pub fn is_time_input(doc: &Document, control: NodeId) -> bool {
    doc.has_class(control, "timepicker")
        || doc.attr(control, "id").is_some_and(|id| id.contains("time"))
}

pub fn is_date_input(doc: &Document, control: NodeId) -> bool {
    doc.attr(control, "id").is_some_and(|id| id.contains("date"))
        || doc.input_type(control) == "date"
}

/// Value to write into a text-like control after date/time normalization.
pub fn text_value_for(doc: &Document, control: NodeId, value: &str, options: &MatchOptions) -> String {
    let normalized = if is_time_input(doc, control) {
        normalize_time(value)
    } else if is_date_input(doc, control) {
        let iso = doc.input_type(control) == "date";
        normalize_date(value, iso, options.date_order)
    } else {
        return value.to_string();
    };

    if normalized.is_empty() {
        value.to_string()
    } else {
        normalized
    }
}

fn apply_text(doc: &mut Document, control: NodeId, value: &str, options: &MatchOptions) -> Applied {
    let text = text_value_for(doc, control, value, options);
    doc.set_value_native(control, &text);
    Applied {
        target: control,
        kind: MutationKind::Text,
    }
}
