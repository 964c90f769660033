use crate::document::Document;
use crate::view::{index_all, View, ViewError};
use serde_json::{json, Value};

/// Emits one entry per tag on a document — the canonical one-to-many view.
struct TagsView;
impl View for TagsView {
    fn map(&self, document: &Document, emit: &mut dyn FnMut(Value, Option<Value>)) {
        if let Some(Value::Array(tags)) = document.get("tags") {
            for tag in tags {
                emit(tag.clone(), Some(json!(true)));
            }
        }
    }
}

struct PanickingView;
impl View for PanickingView {
    fn map(&self, _document: &Document, _emit: &mut dyn FnMut(Value, Option<Value>)) {
        panic!("boom");
    }
}

fn docs() -> Vec<(String, Document)> {
    vec![
        (
            "d1".to_string(),
            Document::from_value(json!({"tags": ["a", "b"]})).unwrap(),
        ),
        (
            "d2".to_string(),
            Document::from_value(json!({"tags": ["b", "c"]})).unwrap(),
        ),
        ("d3".to_string(), Document::from_value(json!({})).unwrap()),
    ]
}

#[test]
fn one_to_many_emit_produces_one_entry_per_emitted_pair() {
    let entries = index_all("tags", &TagsView, &docs(), false).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.document.is_none()));
}

#[test]
fn documents_with_no_emits_contribute_nothing() {
    let entries = index_all("tags", &TagsView, &docs(), false).unwrap();
    assert!(!entries.iter().any(|e| e.document_key == "d3"));
}

#[test]
fn include_documents_attaches_a_clone_of_the_source_document() {
    let entries = index_all("tags", &TagsView, &docs(), true).unwrap();
    let first = entries.iter().find(|e| e.document_key == "d1").unwrap();
    assert!(first.document.is_some());
}

#[test]
fn a_panicking_view_aborts_with_no_partial_result() {
    let err = index_all("bad", &PanickingView, &docs(), false).unwrap_err();
    match err {
        ViewError::MapFailed { name, document_key, cause } => {
            assert_eq!(name, "bad");
            assert_eq!(document_key, "d1");
            assert_eq!(cause, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn emitted_value_defaults_to_none_when_view_omits_it() {
    struct KeyOnlyView;
    impl View for KeyOnlyView {
        fn map(&self, document: &Document, emit: &mut dyn FnMut(Value, Option<Value>)) {
            if document.get("tags").is_some() {
                emit(json!("present"), None);
            }
        }
    }
    let entries = index_all("key_only", &KeyOnlyView, &docs(), false).unwrap();
    assert!(entries.iter().all(|e| e.value.is_none()));
}
