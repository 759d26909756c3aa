use scraper::{Html, Node};

use crate::dom::document::{Document, Element, Render};

/// Inherited rendering context while walking the parsed tree.
#[derive(Clone, Copy)]
struct Inherited {
    undisplayed: bool,
    hidden: bool,
}

/// Build a [`Document`] from HTML markup.
///
/// Rendering facts come from what markup alone can tell: the `hidden`
/// attribute and inline `display`/`visibility` declarations. An element
/// inside an undisplayed subtree has no layout box; visibility inherits
/// unless a descendant sets it back to `visible`.
pub fn parse_html(markup: &str) -> Document {
    let html = Html::parse_document(markup);
    let mut doc = Document::new();
    let root = doc.root();

    let start = Inherited {
        undisplayed: false,
        hidden: false,
    };
    let mut stack = vec![(html.tree.root(), root, start)];

    while let Some((node, parent, inherited)) = stack.pop() {
        let (attach_to, context) = match node.value() {
            Node::Element(el) => {
                let mut element = Element::new(el.name());
                for (name, value) in el.attrs() {
                    element.set_attr(name, value);
                }

                let style = InlineStyle::parse(el.attr("style").unwrap_or(""));
                let display_none = el.attr("hidden").is_some() || style.display_none;
                let visibility_hidden = match style.visibility {
                    Some(visible) => !visible,
                    None => inherited.hidden,
                };
                let undisplayed = inherited.undisplayed || display_none;

                let element = element.with_render(Render {
                    display_none,
                    visibility_hidden,
                    has_layout_box: !undisplayed,
                });
                let id = doc.append_element(parent, element);
                (
                    id,
                    Inherited {
                        undisplayed,
                        hidden: visibility_hidden,
                    },
                )
            }
            Node::Text(text) => {
                let content: &str = &text.text;
                doc.append_text(parent, content);
                continue;
            }
            Node::Document | Node::Fragment => (parent, inherited),
            _ => continue,
        };

        let children: Vec<_> = node.children().collect();
        for child in children.into_iter().rev() {
            stack.push((child, attach_to, context));
        }
    }

    doc.settle_defaults(&[]);
    doc
}

struct InlineStyle {
    display_none: bool,
    visibility: Option<bool>,
}

impl InlineStyle {
    fn parse(style: &str) -> Self {
        let mut parsed = InlineStyle {
            display_none: false,
            visibility: None,
        };
        for declaration in style.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_ascii_lowercase();
            match property.trim().to_ascii_lowercase().as_str() {
                "display" => parsed.display_none = value == "none",
                "visibility" => parsed.visibility = Some(value == "visible"),
                _ => {}
            }
        }
        parsed
    }
}
