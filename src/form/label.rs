use crate::dom::{Document, NodeId};

/// A single way of finding a control's label. Returns `None` when the
/// strategy does not apply or finds only whitespace.
pub type LabelStrategy = fn(&Document, NodeId) -> Option<String>;

/// Label strategies, most reliable association first.
pub const LABEL_STRATEGIES: &[(&str, LabelStrategy)] = &[
    ("label_for", label_for),
    ("aria_labelledby", aria_labelledby),
    ("wrapping_label", wrapping_label),
    ("toggle_sibling_label", toggle_sibling_label),
    ("attribute_text", attribute_text),
    ("preceding_sibling", preceding_sibling),
    ("field_container", field_container),
];

/// Class-name fragments that mark an ancestor as a field wrapper.
pub const FIELD_CONTAINER_MARKERS: &[&str] = &["field", "form-group", "input"];

/// Best human-readable label for `control`, or `""` if nothing matches.
pub fn resolve_label(doc: &Document, control: NodeId) -> String {
    LABEL_STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(doc, control))
        .unwrap_or_default()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn text_of(doc: &Document, node: NodeId) -> Option<String> {
    non_empty(&doc.text_content(node))
}

/// `<label for="...">` pointing at the control's id.
pub fn label_for(doc: &Document, control: NodeId) -> Option<String> {
    let id = doc.non_empty_attr(control, "id")?;
    let label = doc.first_element(|d, n| d.tag(n) == "label" && d.attr(n, "for") == Some(id))?;
    text_of(doc, label)
}

/// Elements referenced by `aria-labelledby`, texts joined with a space.
pub fn aria_labelledby(doc: &Document, control: NodeId) -> Option<String> {
    let refs = doc.non_empty_attr(control, "aria-labelledby")?;
    let joined = refs
        .split_whitespace()
        .filter_map(|r| doc.element_by_id(r))
        .filter_map(|n| text_of(doc, n))
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(&joined)
}

/// Direct text of an ancestor `<label>`, skipping text owned by nested
/// elements such as the control itself or sibling options.
pub fn wrapping_label(doc: &Document, control: NodeId) -> Option<String> {
    let label = doc.ancestors(control).find(|n| doc.tag(*n) == "label")?;
    let joined = doc
        .child_texts(label)
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(&joined)
}

/// Checkboxes and radios are commonly followed by their label.
pub fn toggle_sibling_label(doc: &Document, control: NodeId) -> Option<String> {
    if !doc.is_toggle(control) {
        return None;
    }
    let next = doc.next_element_sibling(control)?;
    if doc.tag(next) != "label" {
        return None;
    }
    text_of(doc, next)
}

/// `aria-label`, then `placeholder`, then `title`.
pub fn attribute_text(doc: &Document, control: NodeId) -> Option<String> {
    ["aria-label", "placeholder", "title"]
        .iter()
        .find_map(|name| doc.attr(control, name).and_then(non_empty))
}

/// A label-like element right before the control.
pub fn preceding_sibling(doc: &Document, control: NodeId) -> Option<String> {
    let prev = doc.previous_element_sibling(control)?;
    if !matches!(doc.tag(prev), "label" | "span" | "div") {
        return None;
    }
    text_of(doc, prev)
}

/// The nearest wrapper `div` whose class looks like a field container, and
/// the first label-like element inside it.
pub fn field_container(doc: &Document, control: NodeId) -> Option<String> {
    let container = doc.closest(control, |d, n| {
        d.tag(n) == "div"
            && d.attr(n, "class")
                .is_some_and(|c| FIELD_CONTAINER_MARKERS.iter().any(|m| c.contains(m)))
    })?;
    let label = doc.descendants(container).into_iter().find(|n| match doc.tag(*n) {
        "label" => true,
        "span" => doc.attr(*n, "class").is_some_and(|c| c.contains("label")),
        _ => false,
    })?;
    text_of(doc, label)
}
