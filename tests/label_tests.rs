use voice_form_fill::form::label::{
    LABEL_STRATEGIES, aria_labelledby, field_container, preceding_sibling, resolve_label,
    toggle_sibling_label, wrapping_label,
};

mod common;
use crate::common::utils::{control, page_with};

#[test]
fn strategies_run_in_documented_order() {
    let names: Vec<_> = LABEL_STRATEGIES.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec![
            "label_for",
            "aria_labelledby",
            "wrapping_label",
            "toggle_sibling_label",
            "attribute_text",
            "preceding_sibling",
            "field_container",
        ]
    );
}

#[test]
fn label_for_beats_everything_else() {
    let doc = page_with(
        r#"<label for="x">Explicit</label>
           <label>Wrapper <input id="x" aria-label="Aria" placeholder="Placeholder"></label>"#,
    );
    assert_eq!(resolve_label(&doc, control(&doc, "x")), "Explicit");
}

#[test]
fn aria_labelledby_joins_all_references() {
    let doc = page_with(
        r#"<span id="first">Billing</span><span id="second">postcode</span>
           <input id="x" aria-labelledby="first missing second">"#,
    );
    assert_eq!(
        aria_labelledby(&doc, control(&doc, "x")).as_deref(),
        Some("Billing postcode")
    );
}

#[test]
fn wrapping_label_ignores_text_of_nested_elements() {
    let doc = page_with(
        r#"<label>Size
             <select id="size"><option>Small</option><option>Large</option></select>
             <em>required</em>
           </label>"#,
    );
    assert_eq!(wrapping_label(&doc, control(&doc, "size")).as_deref(), Some("Size"));
}

#[test]
fn toggle_sibling_label_only_applies_to_toggles() {
    let doc = page_with(
        r#"<input type="checkbox" id="agree"><label>I agree</label>
           <input type="text" id="name"><label>Not mine</label>"#,
    );
    assert_eq!(
        toggle_sibling_label(&doc, control(&doc, "agree")).as_deref(),
        Some("I agree")
    );
    assert_eq!(toggle_sibling_label(&doc, control(&doc, "name")), None);
}

#[test]
fn attribute_text_prefers_aria_label_then_placeholder_then_title() {
    let doc = page_with(
        r#"<input id="a" aria-label="Aria" placeholder="Placeholder" title="Title">
           <input id="b" aria-label="  " placeholder="Placeholder" title="Title">
           <input id="c" title="Title">"#,
    );
    assert_eq!(resolve_label(&doc, control(&doc, "a")), "Aria");
    assert_eq!(resolve_label(&doc, control(&doc, "b")), "Placeholder");
    assert_eq!(resolve_label(&doc, control(&doc, "c")), "Title");
}

#[test]
fn preceding_sibling_accepts_label_like_elements_only() {
    let doc = page_with(
        r#"<div><div>Arrival</div><input id="arrival"></div>
           <div><p>Departure</p><input id="departure"></div>"#,
    );
    assert_eq!(
        preceding_sibling(&doc, control(&doc, "arrival")).as_deref(),
        Some("Arrival")
    );
    assert_eq!(preceding_sibling(&doc, control(&doc, "departure")), None);
}

#[test]
fn field_container_finds_label_span() {
    let doc = page_with(
        r#"<div class="form-field">
             <p><span class="field-label-text">Guests</span></p>
             <p><input id="guests"></p>
           </div>"#,
    );
    assert_eq!(
        field_container(&doc, control(&doc, "guests")).as_deref(),
        Some("Guests")
    );
}

#[test]
fn unlabelled_control_resolves_to_empty() {
    let doc = page_with(r#"<section><p>text</p><input id="lonely"></section>"#);
    assert_eq!(resolve_label(&doc, control(&doc, "lonely")), "");
}
