use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, Element, NodeData, NodeId, Render};

/// Serialized DOM as captured from a live page.
///
/// Element nodes carry the computed rendering facts and the live form state
/// the browser reported; anything omitted falls back to markup defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Element(SnapshotElement),
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotElement {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
    #[serde(default)]
    pub render: Option<Render>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    /// The page's framework tracks this control's value.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tracked: bool,
}

impl Document {
    /// Build a document whose single top-level node is `root`.
    pub fn from_snapshot(root: &SnapshotNode) -> Document {
        let mut doc = Document::new();
        let mut explicit = Vec::new();
        let mut tracked = Vec::new();
        let mut stack = vec![(root, doc.root())];

        while let Some((node, parent)) = stack.pop() {
            match node {
                SnapshotNode::Text { text } => {
                    doc.append_text(parent, text);
                }
                SnapshotNode::Element(el) => {
                    let mut element = Element::new(&el.tag);
                    for (name, value) in &el.attrs {
                        element.set_attr(name, value);
                    }
                    let element = element.with_render(el.render.unwrap_or_default());
                    let id = doc.append_element(parent, element);

                    if let Some(checked) = el.checked {
                        doc.set_initial_checked(id, checked);
                    }
                    if let Some(selected) = el.selected {
                        doc.set_initial_selected(id, selected);
                    }
                    if el.value.is_some() {
                        explicit.push(id);
                    }
                    if el.tracked {
                        tracked.push(id);
                    }
                    for child in el.children.iter().rev() {
                        stack.push((child, id));
                    }
                }
            }
        }

        doc.settle_defaults(&explicit);
        // Values are applied after the subtree exists so selects can resolve
        // their options.
        let top = doc.root();
        apply_explicit_values(&mut doc, root, top);
        for id in tracked {
            doc.track_value(id);
        }
        doc
    }

    /// Capture the document, including live form state, as a snapshot tree.
    /// Returns `None` for an empty document.
    pub fn to_snapshot(&self) -> Option<SnapshotNode> {
        let top = self.children(self.root()).first().copied()?;
        Some(self.snapshot_node(top))
    }

    fn snapshot_node(&self, id: NodeId) -> SnapshotNode {
        match self.data(id) {
            NodeData::Element(el) => {
                let is_toggle = self.is_toggle(id);
                let is_form_value = matches!(el.tag(), "input" | "textarea" | "select");
                SnapshotNode::Element(SnapshotElement {
                    tag: el.tag().to_string(),
                    attrs: el
                        .attrs()
                        .map(|(n, v)| (n.to_string(), v.to_string()))
                        .collect(),
                    children: self
                        .children(id)
                        .iter()
                        .map(|c| self.snapshot_node(*c))
                        .collect(),
                    render: Some(el.render()),
                    value: is_form_value.then(|| self.value(id)),
                    checked: is_toggle.then(|| self.checked(id)),
                    selected: (el.tag() == "option").then(|| self.is_selected(id)),
                    tracked: self.is_tracked(id),
                })
            }
            NodeData::Text(text) => SnapshotNode::Text { text: text.clone() },
            NodeData::Root => SnapshotNode::Text {
                text: String::new(),
            },
        }
    }
}

fn apply_explicit_values(doc: &mut Document, node: &SnapshotNode, parent: NodeId) {
    // Walk the snapshot and the document in lockstep; both were built in
    // the same child order.
    let mut pairs = vec![(node, parent, 0usize)];
    while let Some((node, parent, index)) = pairs.pop() {
        let Some(&id) = doc.children(parent).get(index) else {
            continue;
        };
        if let SnapshotNode::Element(el) = node {
            if let Some(value) = &el.value {
                doc.set_initial_value(id, value);
            }
            for (i, child) in el.children.iter().enumerate() {
                pairs.push((child, id, i));
            }
        }
    }
}
