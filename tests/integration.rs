//! Integration tests for the worksheet export pipeline.
//!
//! These tests exercise the full path from an export request to PDF bytes.
//! They verify:
//! - Every schema field gets a named, typed widget
//! - Stored answers come back out of the PDF under the same names
//! - Content never intrudes on the header or footer
//! - Names stay unique however ids collide
//! - Multi-entry exports follow the stored entries

use std::collections::{HashMap, HashSet};

use lopdf::{Document, Object};
use serde_json::{json, Value};
use worksheet_pdf::config::ExportOptions;
use worksheet_pdf::form::{FieldWidget, WidgetKind};
use worksheet_pdf::{export, export_json, render_document, ExportError, ExportRequest};

// ─── Helpers ────────────────────────────────────────────────────

fn request(value: Value) -> ExportRequest {
    serde_json::from_value(value).expect("valid request")
}

fn thought_record(values: Option<Value>) -> ExportRequest {
    let mut req = json!({
        "title": "Thought Record",
        "description": "Catch, check and change an unhelpful thought.",
        "schema": {
            "sections": [
                {
                    "id": "situation",
                    "title": "Situation",
                    "step": 1,
                    "fields": [
                        { "id": "where", "label": "Where were you?", "type": "text", "placeholder": "At work, at home..." },
                        { "id": "what", "label": "What happened?", "type": "textarea", "rows": 3 },
                        { "id": "when", "label": "When", "type": "date" }
                    ]
                },
                {
                    "id": "feelings",
                    "title": "Feelings",
                    "fields": [
                        {
                            "id": "mood",
                            "label": "Main mood",
                            "type": "select",
                            "options": [
                                { "id": "low", "label": "Low" },
                                { "id": "tense", "label": "Tense" }
                            ]
                        },
                        {
                            "id": "emotions",
                            "label": "Emotions",
                            "type": "checklist",
                            "options": [
                                { "id": "anxious", "label": "Anxious" },
                                { "id": "sad", "label": "Sad" },
                                { "id": "angry", "label": "Angry" }
                            ]
                        },
                        {
                            "id": "intensity",
                            "label": "Intensity",
                            "type": "likert",
                            "min": 0,
                            "max": 10,
                            "anchors": { "0": "None", "10": "Severe" }
                        },
                        { "id": "total", "label": "Total", "type": "computed", "formula": "a + b" }
                    ]
                }
            ]
        }
    });
    if let Some(values) = values {
        req["values"] = values;
    }
    request(req)
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    let tail = String::from_utf8_lossy(&bytes[bytes.len() - 16..]);
    assert!(tail.contains("%%EOF"), "Missing %%EOF marker");
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).expect("dangling reference"),
        other => other,
    }
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, otherwise
/// single-byte.
fn decode_text(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// What a reader sees for one terminal field.
#[derive(Debug, Clone, PartialEq)]
enum ReadValue {
    None,
    Text(String),
    Name(String),
}

/// Walk `/AcroForm /Fields`, joining partial names into full names.
fn read_fields(bytes: &[u8]) -> HashMap<String, (String, ReadValue)> {
    let doc = Document::load_mem(bytes).expect("lopdf parses output");
    let root = resolve(&doc, doc.trailer.get(b"Root").unwrap()).as_dict().unwrap();
    let acroform = resolve(&doc, root.get(b"AcroForm").unwrap()).as_dict().unwrap();
    let fields = resolve(&doc, acroform.get(b"Fields").unwrap()).as_array().unwrap();

    let mut out = HashMap::new();
    for field in fields {
        walk(&doc, field, "", &mut out);
    }
    out
}

fn walk(doc: &Document, obj: &Object, prefix: &str, out: &mut HashMap<String, (String, ReadValue)>) {
    let dict = resolve(doc, obj).as_dict().unwrap();
    let partial = decode_text(dict.get(b"T").unwrap().as_str().unwrap());
    let name = if prefix.is_empty() {
        partial
    } else {
        format!("{}.{}", prefix, partial)
    };

    if let Ok(kids) = dict.get(b"Kids") {
        for kid in resolve(doc, kids).as_array().unwrap() {
            walk(doc, kid, &name, out);
        }
        return;
    }

    let ft = String::from_utf8_lossy(dict.get(b"FT").unwrap().as_name().unwrap()).to_string();
    let value = match dict.get(b"V").map(|v| resolve(doc, v)) {
        Ok(Object::String(bytes, _)) => ReadValue::Text(decode_text(bytes)),
        Ok(Object::Name(name)) => ReadValue::Name(String::from_utf8_lossy(name).to_string()),
        _ => ReadValue::None,
    };
    assert!(out.insert(name.clone(), (ft, value)).is_none(), "duplicate {}", name);
}

/// The single field read back under `path` (name minus disambiguator).
fn read_at<'a>(
    fields: &'a HashMap<String, (String, ReadValue)>,
    path: &str,
) -> &'a (String, ReadValue) {
    let matches: Vec<_> = fields
        .iter()
        .filter(|(name, _)| name.rsplit_once('.').map(|(p, _)| p) == Some(path))
        .collect();
    assert_eq!(matches.len(), 1, "expected one field at {}", path);
    matches[0].1
}

// ─── Blank forms ────────────────────────────────────────────────

#[test]
fn blank_form_has_a_widget_for_every_field() {
    let req = thought_record(None);
    let doc = render_document(&req, &ExportOptions::default()).unwrap();

    let kinds: HashMap<&str, WidgetKind> = doc.fields().map(|f| (f.path(), f.kind())).collect();
    assert_eq!(kinds["situation.where"], WidgetKind::SingleLineText);
    assert_eq!(kinds["situation.what"], WidgetKind::MultilineText);
    assert_eq!(kinds["situation.when"], WidgetKind::SingleLineText);
    assert_eq!(kinds["feelings.mood"], WidgetKind::Dropdown);
    assert_eq!(kinds["feelings.intensity"], WidgetKind::Dropdown);
    for option in ["anxious", "sad", "angry"] {
        assert_eq!(kinds[format!("feelings.emotions.{}", option).as_str()], WidgetKind::Checkbox);
    }
    // Computed fields are display-only.
    assert!(!kinds.contains_key("feelings.total"));
    assert_eq!(doc.fields().count(), 8);

    for field in doc.fields() {
        assert_eq!(field.value(), None, "{} should be empty", field.name);
        assert!(!field.is_checked());
    }
}

#[test]
fn empty_values_map_matches_absent_values() {
    let blank = render_document(&thought_record(None), &ExportOptions::default()).unwrap();
    let empty = render_document(&thought_record(Some(json!({}))), &ExportOptions::default()).unwrap();
    let names = |d: &worksheet_pdf::RenderedDocument| d.fields().map(|f| f.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&blank), names(&empty));
}

#[test]
fn blank_export_is_a_valid_pdf() {
    let bytes = export(&thought_record(None)).unwrap();
    assert_valid_pdf(&bytes);
    let fields = read_fields(&bytes);
    assert_eq!(fields.len(), 8);
    assert!(fields.values().all(|(_, v)| *v != ReadValue::Name("Yes".into())));
}

// ─── Pre-filled values ──────────────────────────────────────────

#[test]
fn stored_answers_round_trip_through_the_pdf() {
    let req = thought_record(Some(json!({
        "where": "Caf\u{e9} on the corner",
        "what": "My friend didn't reply.\nI assumed the worst.",
        "mood": "tense",
        "emotions": ["anxious", "angry"],
        "intensity": 10
    })));

    // In memory.
    let doc = render_document(&req, &ExportOptions::default()).unwrap();
    assert_eq!(doc.field_by_path("situation.where").unwrap().value(), Some("Caf\u{e9} on the corner"));
    assert_eq!(doc.field_by_path("feelings.mood").unwrap().value(), Some("Tense"));
    assert!(doc.field_by_path("feelings.emotions.anxious").unwrap().is_checked());
    assert!(!doc.field_by_path("feelings.emotions.sad").unwrap().is_checked());
    assert_eq!(
        doc.field_by_path("feelings.intensity").unwrap().value(),
        Some("10 \u{2014} Severe")
    );

    // Read back by a PDF reader.
    let bytes = export(&req).unwrap();
    assert_valid_pdf(&bytes);
    let fields = read_fields(&bytes);

    let (ft, value) = read_at(&fields, "situation.where");
    assert_eq!(ft, "Tx");
    assert_eq!(*value, ReadValue::Text("Caf\u{e9} on the corner".into()));

    let (_, value) = read_at(&fields, "situation.what");
    assert_eq!(
        *value,
        ReadValue::Text("My friend didn't reply.\nI assumed the worst.".into())
    );

    let (ft, value) = read_at(&fields, "feelings.mood");
    assert_eq!(ft, "Ch");
    assert_eq!(*value, ReadValue::Text("Tense".into()));

    let (ft, value) = read_at(&fields, "feelings.emotions.anxious");
    assert_eq!(ft, "Btn");
    assert_eq!(*value, ReadValue::Name("Yes".into()));
    let (_, value) = read_at(&fields, "feelings.emotions.sad");
    assert_eq!(*value, ReadValue::Name("Off".into()));

    let (_, value) = read_at(&fields, "feelings.intensity");
    assert_eq!(*value, ReadValue::Text("10 \u{2014} Severe".into()));
}

#[test]
fn likert_selection_uses_anchor_labels_only_on_anchors() {
    let doc = render_document(
        &thought_record(Some(json!({ "intensity": 7 }))),
        &ExportOptions::default(),
    )
    .unwrap();
    let field = doc.field_by_path("feelings.intensity").unwrap();
    assert_eq!(field.value(), Some("7"));
    match &field.widget {
        FieldWidget::Dropdown { options, .. } => {
            assert_eq!(options.len(), 11);
            assert_eq!(options[0], "0 \u{2014} None");
            assert_eq!(options[10], "10 \u{2014} Severe");
        }
        other => panic!("expected dropdown, got {:?}", other),
    }
}

#[test]
fn mistyped_values_render_blank() {
    let doc = render_document(
        &thought_record(Some(json!({
            "where": { "nested": true },
            "emotions": 5,
            "mood": "unknown",
            "intensity": "very"
        }))),
        &ExportOptions::default(),
    )
    .unwrap();
    assert_eq!(doc.field_by_path("feelings.mood").unwrap().value(), None);
    assert_eq!(doc.field_by_path("feelings.intensity").unwrap().value(), None);
    assert!(doc.fields().all(|f| !f.is_checked()));
}

// ─── Pagination ─────────────────────────────────────────────────

fn long_schema() -> ExportRequest {
    let sections: Vec<Value> = (0..12)
        .map(|s| {
            json!({
                "id": format!("s{}", s),
                "title": format!("Section {}", s),
                "description": "Take a moment before answering. ".repeat(6),
                "fields": [
                    { "id": "note", "label": "Notes", "type": "textarea", "rows": 6 },
                    { "id": "name", "label": "Name", "type": "text", "required": true },
                    {
                        "id": "grid",
                        "label": "Grid",
                        "type": "table",
                        "min_rows": 6,
                        "columns": [{ "id": "a", "label": "A" }, { "id": "b", "label": "B", "width": 2 }]
                    },
                    { "id": "hours", "label": "Hours", "type": "number", "unit": "h" },
                    { "id": "day", "label": "Day", "type": "date" },
                    { "id": "at", "label": "At", "type": "time" },
                    {
                        "id": "mood",
                        "label": "Mood",
                        "type": "select",
                        "options": [{ "id": "lo", "label": "Low" }, { "id": "hi", "label": "High" }]
                    },
                    {
                        "id": "signs",
                        "label": "Signs",
                        "type": "checklist",
                        "options": (0..8)
                            .map(|i| json!({ "id": format!("o{}", i), "label": format!("Option {}", i) }))
                            .collect::<Vec<_>>()
                    },
                    {
                        "id": "level",
                        "label": "Level",
                        "type": "likert",
                        "anchors": { "0": "None", "10": "Severe" }
                    },
                    {
                        "id": "ladder",
                        "label": "Ladder",
                        "type": "hierarchy",
                        "min_rows": 4,
                        "columns": [{ "id": "step", "label": "Step" }, { "id": "fear", "label": "Fear" }]
                    },
                    { "id": "score", "label": "Score", "type": "computed" },
                    {
                        "id": "plan",
                        "label": "Safety plan",
                        "type": "safety_plan",
                        "steps": [
                            { "id": "warn", "label": "Warning signs", "fields": [{ "id": "list", "type": "textarea" }] },
                            { "id": "call", "label": "Emergency contacts", "highlight": true,
                              "fields": [{ "id": "who", "type": "text" }, { "id": "phone", "type": "text" }] },
                            { "id": "safe", "label": "Making the environment safe" }
                        ]
                    },
                    {
                        "id": "tree",
                        "label": "Worry tree",
                        "type": "decision_tree",
                        "question": "Can I do something about this?",
                        "yes": { "label": "Yes", "outcome": "Act on the plan",
                                 "fields": [{ "id": "what", "type": "textarea", "rows": 2 }] },
                        "no": { "label": "No", "outcome": "Let the worry go" }
                    },
                    {
                        "id": "cycle",
                        "label": "Cycle",
                        "type": "formulation",
                        "nodes": [
                            { "id": "thought", "label": "Thought", "color": "#3366cc",
                              "description": "What went through your mind?",
                              "fields": [{ "id": "text", "type": "textarea", "rows": 2 }] },
                            { "id": "feeling", "label": "Feeling", "color": "#cc6633" }
                        ],
                        "item_template": { "label": "Trigger", "fields": [{ "id": "what", "type": "text" }] }
                    },
                    {
                        "id": "log",
                        "label": "Log",
                        "type": "record",
                        "groups": [
                            { "id": "event", "label": "Event", "fields": [{ "id": "what", "type": "text" }] },
                            { "id": "response", "label": "Response" }
                        ]
                    }
                ]
            })
        })
        .collect();
    let records: Vec<Value> = (0..3)
        .map(|i| json!({ "event": { "what": format!("Event {}", i) } }))
        .collect();
    request(json!({
        "title": "Long worksheet",
        "instructions": "Work through every section.",
        "schema": { "sections": sections },
        "values": { "log": records, "level": 4 }
    }))
}

#[test]
fn content_stays_inside_the_content_area() {
    let options = ExportOptions::default();
    let doc = render_document(&long_schema(), &options).unwrap();
    assert!(doc.page_count() > 2, "expected several pages, got {}", doc.page_count());

    let top = options.page.content_top();
    let bottom = options.page.content_bottom();
    for (i, page) in doc.pages.iter().enumerate() {
        for el in &page.elements {
            assert!(
                el.y >= top - 0.01 && el.y + el.height <= bottom + 0.01,
                "page {}: element at y={} h={} leaves the content area",
                i + 1,
                el.y,
                el.height
            );
        }
        for field in &page.fields {
            assert!(field.rect.y >= top - 0.01 && field.rect.bottom() <= bottom + 0.01);
        }
    }
}

#[test]
fn every_page_carries_chrome_with_the_true_total() {
    let doc = render_document(&long_schema(), &ExportOptions::default()).unwrap();
    let total = doc.page_count();
    for (i, page) in doc.pages.iter().enumerate() {
        let expected = format!("Page {} of {}", i + 1, total);
        assert!(page.text_lines().any(|t| t == expected), "missing '{}'", expected);
    }
}

#[test]
fn long_export_parses_with_every_page() {
    let req = long_schema();
    let rendered = render_document(&req, &ExportOptions::default()).unwrap();
    let bytes = export(&req).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), rendered.page_count());
    assert_eq!(read_fields(&bytes).len(), rendered.fields().count());
}

// ─── Naming ─────────────────────────────────────────────────────

#[test]
fn names_are_unique_when_ids_collide() {
    // Same field id in two sections, a sub-field sharing its parent's id,
    // and numeric ids that look like disambiguators.
    let req = request(json!({
        "schema": { "sections": [
            { "id": "a", "fields": [
                { "id": "x", "type": "text" },
                { "id": "0", "type": "text" },
                { "id": "rec", "type": "record", "groups": [
                    { "id": "rec", "fields": [{ "id": "x", "type": "text" }, { "id": "1", "type": "text" }] }
                ] }
            ] },
            { "id": "b", "fields": [
                { "id": "x", "type": "text" },
                { "id": "x", "type": "text" }
            ] },
            { "id": "a", "fields": [{ "id": "x", "type": "text" }] }
        ] }
    }));

    let doc = render_document(&req, &ExportOptions::default()).unwrap();
    let names: Vec<&str> = doc.fields().map(|f| f.name.as_str()).collect();
    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(names.len(), unique.len(), "duplicate names in {:?}", names);

    // The AcroForm hierarchy is well formed: every field reads back.
    let fields = read_fields(&export(&req).unwrap());
    assert_eq!(fields.len(), names.len());
}

// ─── Multi-entry ────────────────────────────────────────────────

fn diary(entries: Value) -> ExportRequest {
    request(json!({
        "title": "Sleep diary",
        "schema": {
            "repeatable": true,
            "max_entries": 2,
            "sections": [{ "id": "night", "title": "Night", "fields": [
                { "id": "hours", "label": "Hours slept", "type": "number", "unit": "h" },
                { "id": "quality", "label": "Quality", "type": "likert", "min": 1, "max": 5 }
            ] }]
        },
        "values": { "_entries": entries }
    }))
}

#[test]
fn one_block_per_stored_entry_beyond_max_entries() {
    let req = diary(json!([
        { "hours": 7, "quality": 4 },
        { "hours": 5.5 },
        { "hours": 8, "quality": 5 }
    ]));
    let doc = render_document(&req, &ExportOptions::default()).unwrap();

    let headings = doc
        .pages
        .iter()
        .flat_map(|p| p.text_lines())
        .filter(|t| t.starts_with("Entry "))
        .count();
    assert_eq!(headings, 3);
    assert_eq!(doc.fields().count(), 6);
    assert_eq!(doc.field_by_path("entry2.night.hours").unwrap().value(), Some("5.5"));
    assert_eq!(doc.field_by_path("entry3.night.quality").unwrap().value(), Some("5"));

    let fields = read_fields(&export(&req).unwrap());
    let (_, value) = read_at(&fields, "entry1.night.hours");
    assert_eq!(*value, ReadValue::Text("7".into()));
}

#[test]
fn empty_entry_list_renders_one_blank_form() {
    let doc = render_document(&diary(json!([])), &ExportOptions::default()).unwrap();
    assert_eq!(doc.fields().count(), 2);
    assert!(doc.fields().all(|f| f.value().is_none()));
    assert!(doc.field_by_path("night.hours").is_some());
}

// ─── Structured fields ──────────────────────────────────────────

#[test]
fn table_grows_to_fit_stored_rows() {
    let req = request(json!({
        "schema": { "sections": [{ "id": "s", "fields": [{
            "id": "contacts", "label": "Contacts", "type": "table", "min_rows": 2,
            "columns": [{ "id": "name", "label": "Name" }, { "id": "phone", "label": "Phone" }]
        }] }] },
        "values": { "contacts": [
            { "name": "Ana", "phone": "555-0101" },
            { "name": "Ben" },
            { "name": "Cy", "phone": "555-0103" }
        ] }
    }));
    let doc = render_document(&req, &ExportOptions::default()).unwrap();
    assert_eq!(doc.fields_under("s.contacts").count(), 6);
    assert_eq!(doc.field_by_path("s.contacts.row3.phone").unwrap().value(), Some("555-0103"));
    assert_eq!(doc.field_by_path("s.contacts.row2.phone").unwrap().value(), None);
}

#[test]
fn decision_tree_renders_both_branches() {
    let req = request(json!({
        "schema": { "sections": [{ "id": "s", "fields": [{
            "id": "worry", "label": "Can I act on this?", "type": "decision_tree",
            "question": "Is this a problem I can solve?",
            "yes": { "label": "Yes", "outcome": "Make a plan",
                     "fields": [{ "id": "plan", "label": "Plan", "type": "textarea" }] },
            "no": { "label": "No", "outcome": "Let it go",
                    "fields": [{ "id": "refocus", "label": "Refocus on", "type": "text" }] }
        }] }] },
        "values": { "worry": { "yes": { "plan": "Call the bank" } } }
    }));
    let doc = render_document(&req, &ExportOptions::default()).unwrap();
    assert_eq!(doc.field_by_path("s.worry.yes.plan").unwrap().value(), Some("Call the bank"));
    assert!(doc.field_by_path("s.worry.no.refocus").is_some());
    let texts: Vec<&str> = doc.pages.iter().flat_map(|p| p.text_lines()).collect();
    assert!(texts.contains(&"Outcome: Make a plan"));
    assert!(texts.contains(&"Outcome: Let it go"));
}

#[test]
fn bad_swatch_colour_does_not_abort() {
    let req = request(json!({
        "schema": { "sections": [{ "id": "s", "fields": [{
            "id": "cycle", "label": "Cycle", "type": "formulation",
            "nodes": [
                { "id": "thought", "label": "Thought", "color": "not-a-colour",
                  "fields": [{ "id": "text", "type": "text" }] },
                { "id": "feeling", "label": "Feeling", "color": "#3366cc" }
            ]
        }] }] }
    }));
    let bytes = export(&req).unwrap();
    assert_valid_pdf(&bytes);
    let fields = read_fields(&bytes);
    read_at(&fields, "s.cycle.nodes.thought.text");
    read_at(&fields, "s.cycle.nodes.feeling");
}

// ─── Errors ─────────────────────────────────────────────────────

#[test]
fn unloadable_logo_is_a_resource_error() {
    let mut options = ExportOptions::default();
    options.branding.logo = Some("/no/such/logo.png".into());
    let result = worksheet_pdf::export_with_options(&thought_record(None), &options);
    assert!(matches!(result, Err(ExportError::Resource(_))));
}

#[test]
fn malformed_json_reports_a_hint() {
    let err = export_json(r#"{ "schema": { "sections": [], } }"#).unwrap_err();
    assert!(matches!(err, ExportError::Parse { .. }));
    assert!(err.to_string().contains("Hint:"));
}

#[test]
fn export_json_accepts_camel_case_branding_flag() {
    let bytes = export_json(
        r#"{ "title": "Plain", "showBranding": false, "schema": { "sections": [] } }"#,
    )
    .unwrap();
    assert_valid_pdf(&bytes);
}
