use std::cell::RefCell;

use es3_core::codec::{Codec, CodecError, JsonContainerCodec, Mapping};
use es3_core::core_api::{CoreErrorCode, Document, DocumentState};
use es3_core::tag::ValueTag;
use serde_json::{Value, json};

const KEY: &str = "test-key";

fn save_bytes() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "PlayersMoney": {"__type": "int", "value": 500},
        "Experience": {"__type": "int", "value": 1200},
        "fovValue": {"__type": "float", "value": 90.0},
        "isTutorialCompleted": {"__type": "bool", "value": false},
        "PlayerName": "Casper",
        "LooseCount": 3,
        "Inventory": {
            "__type": "System.Collections.Generic.Dictionary`2[[System.String],[System.Int32]]",
            "value": {"EMF Reader": 2, "Flashlight": 1, "Crucifix": 0}
        },
        "Settings": {"volume": 0.8, "subtitles": true, "layout": {"hud": 1}}
    }))
    .expect("fixture serializes")
}

fn loaded() -> Document<JsonContainerCodec> {
    let mut doc = Document::new(JsonContainerCodec::new(), KEY);
    doc.load(save_bytes()).expect("fixture loads");
    doc
}

fn entry_value(doc: &Document<JsonContainerCodec>, key: &str) -> Value {
    doc.raw()
        .expect("document loaded")
        .get(key)
        .unwrap_or_else(|| panic!("missing entry {key}"))
        .to_raw()
}

/// Records the template bytes passed to `encode` and tags its output.
#[derive(Default)]
struct RecordingCodec {
    templates: RefCell<Vec<Vec<u8>>>,
    fail_encode: bool,
}

impl Codec for RecordingCodec {
    fn decode(&self, bytes: &[u8], key: &str) -> Result<Mapping, CodecError> {
        JsonContainerCodec::new().decode(bytes, key)
    }

    fn encode(
        &self,
        original: &[u8],
        key: &str,
        mapping: &Mapping,
    ) -> Result<Vec<u8>, CodecError> {
        self.templates.borrow_mut().push(original.to_vec());
        if self.fail_encode {
            return Err(CodecError::new("encoder refused"));
        }
        JsonContainerCodec::new().encode(original, key, mapping)
    }
}

#[test]
fn new_document_is_unloaded_and_rejects_access() {
    let mut doc = Document::new(JsonContainerCodec::new(), KEY);
    assert_eq!(doc.state(), DocumentState::Unloaded);
    assert_eq!(doc.key(), KEY);

    let err = doc.save().expect_err("save without load must fail");
    assert_eq!(err.code, CoreErrorCode::Sequence);
    assert!(err.message.contains("no prior load"));

    let err = doc.raw().expect_err("raw without load must fail");
    assert_eq!(err.code, CoreErrorCode::Sequence);

    let err = doc
        .set_entry_text("PlayersMoney", "1")
        .expect_err("edit without load must fail");
    assert_eq!(err.code, CoreErrorCode::Sequence);
}

#[test]
fn state_moves_through_load_mutate_save() {
    let mut doc = loaded();
    assert_eq!(doc.state(), DocumentState::Loaded);

    doc.set_entry_text("PlayersMoney", "750")
        .expect("integer edit accepted");
    assert_eq!(doc.state(), DocumentState::Mutated);

    doc.save().expect("save succeeds");
    assert_eq!(doc.state(), DocumentState::Persisted);
    assert!(doc.state().is_loaded());

    doc.set_entry_text("Experience", "1300")
        .expect("editing after save is allowed");
    assert_eq!(doc.state(), DocumentState::Mutated);
}

#[test]
fn decode_failure_enters_error_state_until_reloaded() {
    let mut doc = loaded();
    let err = doc
        .load(b"not json at all".to_vec())
        .expect_err("garbage must not decode");
    assert_eq!(err.code, CoreErrorCode::Codec);
    assert_eq!(doc.state(), DocumentState::Error);

    let err = doc.save().expect_err("error state blocks save");
    assert_eq!(err.code, CoreErrorCode::Sequence);

    doc.load(save_bytes()).expect("reload recovers");
    assert_eq!(doc.state(), DocumentState::Loaded);
}

#[test]
fn save_passes_original_bytes_then_rebinds_to_new_bytes() {
    let original = save_bytes();
    let mut doc = Document::new(RecordingCodec::default(), KEY);
    doc.load(original.clone()).expect("fixture loads");

    doc.set_entry_text("PlayersMoney", "900").expect("edit");
    let first = doc.save().expect("first save");
    doc.set_entry_text("PlayersMoney", "950").expect("edit");
    doc.save().expect("second save");

    let doc_raw = doc.raw().expect("still loaded");
    assert_ne!(doc_raw.original_bytes(), original.as_slice());

    let templates = doc_codec_templates(&doc);
    assert_eq!(templates.len(), 2);
    assert_eq!(templates[0], original);
    assert_eq!(templates[1], first);
}

fn doc_codec_templates(doc: &Document<RecordingCodec>) -> Vec<Vec<u8>> {
    doc.codec().templates.borrow().clone()
}

#[test]
fn encode_failure_keeps_mapping_and_requires_reload() {
    let mut doc = Document::new(
        RecordingCodec {
            fail_encode: true,
            ..RecordingCodec::default()
        },
        KEY,
    );
    doc.load(save_bytes()).expect("fixture loads");
    doc.set_entry_text("PlayersMoney", "42").expect("edit");

    let err = doc.save().expect_err("encoder refuses");
    assert_eq!(err.code, CoreErrorCode::Codec);
    assert_eq!(doc.state(), DocumentState::Error);

    doc.load(save_bytes()).expect("reload recovers");
    let money = doc.raw().expect("loaded").get("PlayersMoney").map(|e| e.to_raw());
    assert_eq!(money, Some(json!({"__type": "int", "value": 500})));
}

#[test]
fn entry_edits_report_each_rejection_and_apply_the_rest() {
    let mut doc = loaded();
    let edits = vec![
        ("PlayersMoney".to_string(), "abc".to_string()),
        ("Experience".to_string(), "1500".to_string()),
        ("fovValue".to_string(), "75".to_string()),
        ("PlayerName".to_string(), "Banshee".to_string()),
        ("Nope".to_string(), "1".to_string()),
        ("isTutorialCompleted".to_string(), "true".to_string()),
    ];

    let report = doc.apply_entry_edits(&edits).expect("document loaded");

    assert_eq!(report.applied, vec!["Experience", "fovValue", "PlayerName"]);
    let rejected: Vec<&str> = report.rejected.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(rejected, vec!["PlayersMoney", "Nope", "isTutorialCompleted"]);
    assert_eq!(report.rejected[0].expected, Some(ValueTag::Integer));
    assert_eq!(report.rejected[1].expected, None);
    assert_eq!(report.rejected[1].reason, "no such entry");
    assert!(!report.is_clean());
    assert_eq!(doc.state(), DocumentState::Mutated);

    assert_eq!(
        entry_value(&doc, "PlayersMoney"),
        json!({"__type": "int", "value": 500})
    );
    assert_eq!(
        entry_value(&doc, "Experience"),
        json!({"__type": "int", "value": 1500})
    );
    assert_eq!(
        entry_value(&doc, "fovValue"),
        json!({"__type": "float", "value": 75.0})
    );
    assert_eq!(entry_value(&doc, "PlayerName"), json!("Banshee"));
}

#[test]
fn fully_rejected_batch_leaves_state_unchanged() {
    let mut doc = loaded();
    let report = doc
        .apply_entry_edits(&[("PlayersMoney".to_string(), "lots".to_string())])
        .expect("document loaded");
    assert!(!report.has_changes());
    assert_eq!(doc.state(), DocumentState::Loaded);
}

#[test]
fn booleans_toggle_but_never_parse_from_text() {
    let mut doc = loaded();

    let err = doc
        .set_entry_text("isTutorialCompleted", "true")
        .expect_err("text edit of a boolean");
    assert_eq!(err.code, CoreErrorCode::Conversion);

    doc.set_entry_bool("isTutorialCompleted", true)
        .expect("toggle accepted");
    assert_eq!(
        entry_value(&doc, "isTutorialCompleted"),
        json!({"__type": "bool", "value": true})
    );

    let err = doc
        .set_entry_bool("PlayersMoney", true)
        .expect_err("toggle of an integer");
    assert_eq!(err.code, CoreErrorCode::Conversion);
}

#[test]
fn unknown_entry_is_not_found() {
    let mut doc = loaded();
    let err = doc
        .set_entry_text("Missing", "1")
        .expect_err("no such entry");
    assert_eq!(err.code, CoreErrorCode::NotFound);
}

#[test]
fn nested_editor_edits_only_what_it_touches() {
    let mut doc = loaded();
    let mut editor = doc.open_nested("Settings").expect("plain mapping opens");
    assert_eq!(editor.key(), "Settings");
    assert_eq!(editor.len(), 3);
    assert_eq!(
        editor.rows(),
        vec![
            ("volume".to_string(), Some("0.8".to_string())),
            ("subtitles".to_string(), Some("true".to_string())),
            ("layout".to_string(), None),
        ]
    );

    editor.set("volume", "1").expect("float accepts integral text");
    editor.set("fov", "90").expect("new key inferred");
    editor.set_bool("subtitles", false).expect("toggle");
    assert!(editor.set("subtitles", "yes").is_err());

    doc.apply_nested(editor).expect("applied");
    assert_eq!(
        entry_value(&doc, "Settings"),
        json!({"volume": 1.0, "subtitles": false, "layout": {"hud": 1}, "fov": 90})
    );
    assert_eq!(doc.state(), DocumentState::Mutated);
}

#[test]
fn nested_editor_rename_and_remove_keep_order() {
    let mut doc = loaded();
    let mut editor = doc.open_nested("Inventory").expect("wrapped mapping opens");

    assert!(editor.rename("Flashlight", "UV Light"));
    assert!(!editor.rename("Flashlight", "Torch"));
    assert!(!editor.rename("EMF Reader", "Crucifix"));
    assert!(editor.remove("Crucifix"));
    assert!(!editor.remove("Crucifix"));

    doc.apply_nested(editor).expect("applied");
    let inventory = entry_value(&doc, "Inventory");
    assert_eq!(
        inventory["__type"],
        json!("System.Collections.Generic.Dictionary`2[[System.String],[System.Int32]]")
    );
    let keys: Vec<&String> = inventory["value"]
        .as_object()
        .expect("value is a mapping")
        .keys()
        .collect();
    assert_eq!(keys, vec!["EMF Reader", "UV Light"]);
}

#[test]
fn emptied_nested_mapping_is_kept_and_siblings_untouched() {
    let mut doc = loaded();
    let before = doc.raw().expect("loaded").clone();

    let mut editor = doc.open_nested("Inventory").expect("opens");
    for key in ["EMF Reader", "Flashlight", "Crucifix"] {
        assert!(editor.remove(key));
    }
    assert!(editor.is_empty());
    doc.apply_nested(editor).expect("applied");

    let after = doc.raw().expect("loaded");
    assert_eq!(
        after.get("Inventory").map(|e| e.to_raw()),
        Some(json!({
            "__type": "System.Collections.Generic.Dictionary`2[[System.String],[System.Int32]]",
            "value": {}
        }))
    );
    for key in before.keys().filter(|key| *key != "Inventory") {
        assert_eq!(after.get(key), before.get(key), "sibling {key} changed");
    }
}

#[test]
fn scalar_entries_do_not_open_as_nested() {
    let doc = loaded();
    let err = doc
        .open_nested("PlayersMoney")
        .expect_err("integer is not a mapping");
    assert_eq!(err.code, CoreErrorCode::Conversion);
}

#[test]
fn commit_rejects_mapping_from_another_load() {
    let mut doc = loaded();
    let stale = doc.raw().expect("loaded").clone();
    doc.set_entry_text("PlayersMoney", "1").expect("edit");
    doc.save().expect("save rebinds");

    let err = doc.commit(stale).expect_err("stale mapping");
    assert_eq!(err.code, CoreErrorCode::Sequence);
}

#[test]
fn entry_rows_describe_every_entry_in_order() {
    let doc = loaded();
    let rows = doc.raw().expect("loaded").rows();
    let keys: Vec<&str> = rows.iter().map(|row| row.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "PlayersMoney",
            "Experience",
            "fovValue",
            "isTutorialCompleted",
            "PlayerName",
            "LooseCount",
            "Inventory",
            "Settings"
        ]
    );
    assert_eq!(rows[0].type_name.as_deref(), Some("int"));
    assert_eq!(rows[0].display.as_deref(), Some("500"));
    assert_eq!(rows[4].tag, ValueTag::Text);
    assert_eq!(rows[4].type_name, None);
    assert_eq!(rows[6].tag, ValueTag::Opaque);
    assert_eq!(rows[6].display, None);
}

#[test]
fn entry_toggles_only_apply_to_boolean_entries() {
    let mut doc = loaded();
    let report = doc
        .apply_entry_toggles(&[
            ("isTutorialCompleted".to_string(), true),
            ("PlayersMoney".to_string(), true),
            ("Nope".to_string(), false),
        ])
        .expect("document loaded");

    assert_eq!(report.applied, vec!["isTutorialCompleted"]);
    let rejected: Vec<&str> = report.rejected.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(rejected, vec!["PlayersMoney", "Nope"]);
    assert_eq!(report.rejected[0].expected, Some(ValueTag::Boolean));
    assert_eq!(doc.state(), DocumentState::Mutated);
    assert_eq!(
        entry_value(&doc, "isTutorialCompleted"),
        json!({"__type": "bool", "value": true})
    );
    assert_eq!(
        entry_value(&doc, "PlayersMoney"),
        json!({"__type": "int", "value": 500})
    );
}
