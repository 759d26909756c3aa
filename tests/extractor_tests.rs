use std::collections::HashSet;

use voice_form_fill::form::extractor::field_id;
use voice_form_fill::form::{FieldKind, SelectOption, extract_fields};

mod common;
use crate::common::utils::{control, load_fixture, page_with};

fn ids(doc: &voice_form_fill::dom::Document) -> Vec<String> {
    extract_fields(doc).into_iter().map(|f| f.id).collect()
}

#[test]
fn extracts_fillable_controls_in_document_order() {
    let doc = load_fixture("contact_form.html");
    assert_eq!(
        ids(&doc),
        vec![
            "full_name",
            "email",
            "phone",
            "company",
            "country",
            "message",
            "gender_male",
            "gender_female",
            "subscribe",
            "start_date",
            "meeting_time",
            "birth_date",
            "team",
            "field_18",
        ]
    );
}

#[test]
fn extraction_is_idempotent() {
    let doc = load_fixture("contact_form.html");
    assert_eq!(extract_fields(&doc), extract_fields(&doc));
}

#[test]
fn field_ids_are_unique_and_first_wins() {
    let doc = load_fixture("contact_form.html");
    let fields = extract_fields(&doc);

    let unique: HashSet<_> = fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(unique.len(), fields.len());

    let full_name = fields.iter().find(|f| f.id == "full_name").unwrap();
    assert_eq!(full_name.name, "fullName");
}

#[test]
fn hidden_and_non_interactive_controls_are_skipped() {
    let doc = load_fixture("contact_form.html");
    let ids = ids(&doc);
    for skipped in ["csrf", "ghost", "hidden_parent", "invisible"] {
        assert!(!ids.contains(&skipped.to_string()), "{skipped} should be skipped");
    }
}

#[test]
fn hidden_select2_source_is_kept_and_marked() {
    let doc = load_fixture("contact_form.html");
    let fields = extract_fields(&doc);
    let team = fields.iter().find(|f| f.id == "team").unwrap();

    assert!(team.is_select2);
    assert_eq!(team.kind, FieldKind::Select);
    assert_eq!(team.current_value, "red");
}

#[test]
fn select_options_exclude_empty_placeholder() {
    let doc = load_fixture("contact_form.html");
    let fields = extract_fields(&doc);
    let country = fields.iter().find(|f| f.id == "country").unwrap();

    assert_eq!(
        country.options,
        vec![
            SelectOption { value: "us".into(), text: "United States".into() },
            SelectOption { value: "gb".into(), text: "United Kingdom".into() },
            SelectOption { value: "in".into(), text: "India".into() },
        ]
    );
    assert_eq!(country.label, "Country");
}

#[test]
fn descriptor_kinds_and_current_values() {
    let doc = load_fixture("contact_form.html");
    let fields = extract_fields(&doc);
    let by_id = |id: &str| fields.iter().find(|f| f.id == id).unwrap().clone();

    assert_eq!(by_id("email").kind, FieldKind::Native("email".into()));
    assert_eq!(by_id("message").kind, FieldKind::Textarea);
    assert_eq!(by_id("message").current_value, "Hello");
    assert_eq!(by_id("message").tag_name, "textarea");
    assert_eq!(by_id("gender_female").kind, FieldKind::Radio);
    assert_eq!(by_id("subscribe").current_value, "unchecked");
    assert_eq!(by_id("start_date").kind, FieldKind::Date);
    assert_eq!(by_id("company").placeholder, "Company name");
}

#[test]
fn labels_resolved_through_fallback_chain() {
    let doc = load_fixture("contact_form.html");
    let fields = extract_fields(&doc);
    let label = |id: &str| fields.iter().find(|f| f.id == id).unwrap().label.clone();

    assert_eq!(label("full_name"), "Full name");
    assert_eq!(label("email"), "Email address");
    assert_eq!(label("phone"), "Phone");
    assert_eq!(label("company"), "Company name");
    assert_eq!(label("gender_female"), "Female");
    assert_eq!(label("meeting_time"), "Meeting time");
    assert_eq!(label("field_18"), "");
}

#[test]
fn id_falls_back_through_attributes_then_index() {
    let doc = page_with(
        r#"<input id="by_id" name="n1">
           <input name="by_name">
           <input data-testid="by_testid">
           <input data-field="by_field">
           <input data-automation-id="by_automation">
           <input aria-labelledby="by_aria">
           <input id="" name="">"#,
    );
    assert_eq!(
        ids(&doc),
        vec!["by_id", "by_name", "by_testid", "by_field", "by_automation", "by_aria", "field_6"]
    );
    assert_eq!(field_id(&doc, control(&doc, "by_id"), 0), "by_id");
}

#[test]
fn page_without_fields_yields_nothing() {
    let doc = load_fixture("no_form.html");
    assert!(extract_fields(&doc).is_empty());
}

#[test]
fn descriptor_wire_format() {
    let doc = page_with(r#"<label for="city">City</label><input id="city" name="city" placeholder="e.g. Paris">"#);
    let json = serde_json::to_value(extract_fields(&doc)).unwrap();

    assert_eq!(
        json,
        serde_json::json!([{
            "id": "city",
            "name": "city",
            "type": "text",
            "label": "City",
            "tagName": "input",
            "placeholder": "e.g. Paris",
            "currentValue": ""
        }])
    );
}

#[test]
fn snapshot_pages_extract_with_reported_render_state() {
    let doc = load_fixture("booking_snapshot.json");
    let fields = extract_fields(&doc);
    let ids: Vec<_> = fields.iter().map(|f| f.id.as_str()).collect();

    assert_eq!(ids, vec!["guest", "nights", "room", "breakfast"]);
    assert_eq!(fields[2].label, "Room type");
    assert_eq!(fields[3].label, "Include breakfast");
}
