use serde::{Deserialize, Serialize};

/// Handle to a node inside a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Computed rendering facts for an element.
///
/// `has_layout_box` is false when the element (or an ancestor) is not
/// rendered at all, the equivalent of a null `offsetParent` in a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Render {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub has_layout_box: bool,
}

impl Default for Render {
    fn default() -> Self {
        Self {
            display_none: false,
            visibility_hidden: false,
            has_layout_box: true,
        }
    }
}

impl Render {
    pub fn is_rendered(&self) -> bool {
        !self.display_none && !self.visibility_hidden && self.has_layout_box
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
    Blur,
    Click,
}

/// Which setter a value write went through.
///
/// `Property` models a plain `element.value = ...` that a framework has
/// intercepted; `Native` bypasses the interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetterPath {
    Native,
    Property,
}

/// One observable change made to the document, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetValue {
        target: NodeId,
        value: String,
        setter: SetterPath,
    },
    SetChecked {
        target: NodeId,
        checked: bool,
    },
    Dispatch {
        target: NodeId,
        event: EventKind,
    },
    ScrollIntoView {
        target: NodeId,
    },
}

#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    value: String,
    checked: bool,
    selected: bool,
    render: Render,
    tracker: Option<String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            value: String::new(),
            checked: false,
            selected: false,
            render: Render::default(),
            tracker: None,
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_render(mut self, render: Render) -> Self {
        self.render = render;
        self
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn render(&self) -> Render {
        self.render
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A mutable, arena-backed DOM.
///
/// Besides structure it carries the live form state (values, checked and
/// selected flags), rendering facts, and an ordered log of every mutation
/// and dispatched event so that a write can be inspected or replayed.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    mutations: Vec<Mutation>,
    framework_updates: Vec<(NodeId, String)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
            mutations: Vec::new(),
            framework_updates: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn append_element(&mut self, parent: NodeId, mut element: Element) -> NodeId {
        if let Some(value) = element.attr("value").map(str::to_string) {
            element.value = value;
        }
        element.checked = element.has_attr("checked");
        element.selected = element.has_attr("selected");
        self.push(parent, NodeData::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeData::Text(text.to_string()))
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Apply browser defaults once the tree is complete: a textarea's value
    /// comes from its text, and a single-choice select with no explicit
    /// selection selects its first option.
    pub(crate) fn settle_defaults(&mut self, explicit_values: &[NodeId]) {
        for id in self.elements() {
            if explicit_values.contains(&id) {
                continue;
            }
            let tag = self.tag(id).to_string();
            match tag.as_str() {
                "textarea" => {
                    let text = self.text_content(id);
                    if let Some(el) = self.element_mut(id) {
                        el.value = text;
                    }
                }
                "select" if !self.has_attr(id, "multiple") => {
                    let options = self.options(id);
                    if !options.is_empty() && !options.iter().any(|o| self.is_selected(*o)) {
                        if let Some(el) = self.element_mut(options[0]) {
                            el.selected = true;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    pub(crate) fn set_initial_value(&mut self, id: NodeId, value: &str) {
        if self.tag(id) == "select" {
            self.select_by_value(id, value);
        } else if let Some(el) = self.element_mut(id) {
            el.value = value.to_string();
        }
    }

    pub(crate) fn set_initial_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
    }

    pub(crate) fn set_initial_selected(&mut self, id: NodeId, selected: bool) {
        if let Some(el) = self.element_mut(id) {
            el.selected = selected;
        }
    }

    // ------------------------------------------------------------------
    // Structure queries
    // ------------------------------------------------------------------

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Tag name in lowercase, or `""` for non-element nodes.
    pub fn tag(&self, id: NodeId) -> &str {
        self.element(id).map(Element::tag).unwrap_or("")
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    /// Attribute value, treating an empty attribute as absent.
    pub fn non_empty_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name).filter(|v| !v.is_empty())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.element(id)
            .map(|el| el.classes().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every element in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.is_element(*id))
            .collect()
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |n| self.parent(*n))
    }

    /// Nearest element, starting with `id` itself, that satisfies `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Document, NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.is_element(*n) && pred(self, *n))
    }

    pub fn first_element(&self, pred: impl Fn(&Document, NodeId) -> bool) -> Option<NodeId> {
        self.elements().into_iter().find(|n| pred(self, *n))
    }

    pub fn find_all(&self, pred: impl Fn(&Document, NodeId) -> bool) -> Vec<NodeId> {
        self.elements().into_iter().filter(|n| pred(self, *n)).collect()
    }

    pub fn element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        if dom_id.is_empty() {
            return None;
        }
        self.first_element(|d, n| d.attr(n, "id") == Some(dom_id))
    }

    fn element_siblings(&self, id: NodeId) -> (Vec<NodeId>, Option<usize>) {
        let Some(parent) = self.parent(id) else {
            return (Vec::new(), None);
        };
        let siblings: Vec<NodeId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|n| self.is_element(*n))
            .collect();
        let pos = siblings.iter().position(|n| *n == id);
        (siblings, pos)
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.element_siblings(id);
        siblings.get(pos? + 1).copied()
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.element_siblings(id);
        let pos = pos?;
        if pos == 0 { None } else { siblings.get(pos - 1).copied() }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        if let NodeData::Text(text) = self.data(id) {
            return text.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.data(n) {
                NodeData::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text nodes that are direct children of `id`.
    pub fn child_texts(&self, id: NodeId) -> Vec<&str> {
        self.children(id)
            .iter()
            .filter_map(|n| match self.data(*n) {
                NodeData::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Child-index path from the root to `id`.
    pub fn path_of(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let pos = self
                .children(parent)
                .iter()
                .position(|n| *n == current)
                .unwrap_or_default();
            path.push(pos);
            current = parent;
        }
        path.reverse();
        path
    }

    // ------------------------------------------------------------------
    // Form state
    // ------------------------------------------------------------------

    /// Browser-style `type` of a form control: lowercase `type` attribute
    /// for inputs (defaulting to `text`), `select-one`/`select-multiple`
    /// for selects and `textarea` for textareas.
    pub fn input_type(&self, id: NodeId) -> String {
        match self.tag(id) {
            "select" if self.has_attr(id, "multiple") => "select-multiple".into(),
            "select" => "select-one".into(),
            "textarea" => "textarea".into(),
            _ => self
                .non_empty_attr(id, "type")
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_else(|| "text".into()),
        }
    }

    pub fn is_toggle(&self, id: NodeId) -> bool {
        self.tag(id) == "input" && matches!(self.input_type(id).as_str(), "checkbox" | "radio")
    }

    pub fn is_rendered(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.render.is_rendered())
    }

    /// Live value of a control. For a select this is the value of its first
    /// selected option.
    pub fn value(&self, id: NodeId) -> String {
        if self.tag(id) == "select" {
            return self
                .options(id)
                .into_iter()
                .find(|o| self.is_selected(*o))
                .map(|o| self.option_value(o))
                .unwrap_or_default();
        }
        self.element(id).map(|el| el.value.clone()).unwrap_or_default()
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.checked)
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.selected)
    }

    /// `<option>` descendants of a select, in order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|n| self.tag(*n) == "option")
            .collect()
    }

    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self.option_text(option),
        }
    }

    /// Option label with whitespace collapsed, like `HTMLOptionElement.text`.
    pub fn option_text(&self, option: NodeId) -> String {
        self.text_content(option)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Write a value through the element's native setter. A framework value
    /// tracker is left untouched, so it notices the change on the next
    /// input/change event.
    pub fn set_value_native(&mut self, id: NodeId, value: &str) {
        self.assign_value(id, value);
        self.mutations.push(Mutation::SetValue {
            target: id,
            value: value.to_string(),
            setter: SetterPath::Native,
        });
    }

    /// Write a value through the (possibly framework-intercepted) property.
    /// The tracker records the new value as already seen.
    pub fn set_value_property(&mut self, id: NodeId, value: &str) {
        self.assign_value(id, value);
        let state = self.tracked_state(id);
        if let Some(el) = self.element_mut(id) {
            if el.tracker.is_some() {
                el.tracker = Some(state);
            }
        }
        self.mutations.push(Mutation::SetValue {
            target: id,
            value: value.to_string(),
            setter: SetterPath::Property,
        });
    }

    fn assign_value(&mut self, id: NodeId, value: &str) {
        if self.tag(id) == "select" {
            self.select_by_value(id, value);
        } else if let Some(el) = self.element_mut(id) {
            el.value = value.to_string();
        }
    }

    fn select_by_value(&mut self, select: NodeId, value: &str) {
        let options = self.options(select);
        let target = options.iter().copied().find(|o| self.option_value(*o) == value);
        for option in options {
            if let Some(el) = self.element_mut(option) {
                el.selected = Some(option) == target;
            }
        }
    }

    /// Select `option` inside `select` through the native path.
    pub fn select_option(&mut self, select: NodeId, option: NodeId) {
        let value = self.option_value(option);
        self.set_value_native(select, &value);
    }

    /// Set the checked state. Checking a radio unchecks the other radios
    /// sharing its name, as a browser does.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if checked && self.input_type(id) == "radio" {
            if let Some(name) = self.non_empty_attr(id, "name").map(str::to_string) {
                let peers = self.find_all(|d, n| {
                    n != id && d.input_type(n) == "radio" && d.attr(n, "name") == Some(name.as_str())
                });
                for peer in peers {
                    if let Some(el) = self.element_mut(peer) {
                        el.checked = false;
                    }
                }
            }
        }
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
        self.mutations.push(Mutation::SetChecked { target: id, checked });
    }

    /// Dispatch a bubbling event. Input and change events let an attached
    /// value tracker compare and pick up the current value.
    pub fn dispatch(&mut self, id: NodeId, event: EventKind) {
        self.mutations.push(Mutation::Dispatch { target: id, event });
        if !matches!(event, EventKind::Input | EventKind::Change | EventKind::Click) {
            return;
        }
        let state = self.tracked_state(id);
        let observed = match self.element_mut(id) {
            Some(el) if el.tracker.as_ref().is_some_and(|seen| *seen != state) => {
                el.tracker = Some(state.clone());
                true
            }
            _ => false,
        };
        if observed {
            self.framework_updates.push((id, state));
        }
    }

    pub fn scroll_into_view(&mut self, id: NodeId) {
        self.mutations.push(Mutation::ScrollIntoView { target: id });
    }

    /// Attach a framework value tracker seeded with the current state.
    pub fn track_value(&mut self, id: NodeId) {
        let state = self.tracked_state(id);
        if let Some(el) = self.element_mut(id) {
            el.tracker = Some(state);
        }
    }

    pub fn is_tracked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.tracker.is_some())
    }

    fn tracked_state(&self, id: NodeId) -> String {
        if self.is_toggle(id) {
            self.checked(id).to_string()
        } else {
            self.value(id)
        }
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Events dispatched so far, in order.
    pub fn events(&self) -> Vec<(NodeId, EventKind)> {
        self.mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::Dispatch { target, event } => Some((*target, *event)),
                _ => None,
            })
            .collect()
    }

    /// Values a framework value tracker has picked up, in order.
    pub fn framework_updates(&self) -> &[(NodeId, String)] {
        &self.framework_updates
    }
}
