use std::io::{Read, Write};

use es3_core::codec::{Codec, JsonContainerCodec, Mapping};
use es3_core::core_api::Document;
use es3_core::entry::{Entry, EntryForm};
use es3_core::tag::ValueTag;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::{Value, json};

const KEY: &str = "unused-key";

fn sample_save() -> Value {
    json!({
        "PlayersMoney": {"__type": "int", "value": 500},
        "Experience": {"__type": "int", "value": 1200},
        "fovValue": {"__type": "float", "value": 90.0},
        "isTutorialCompleted": {"__type": "bool", "value": true},
        "PlayerName": "Casper",
        "LooseFlag": false,
        "LooseRatio": 0.25,
        "ItemInventory": {
            "__type": "System.Collections.Generic.Dictionary`2[[System.String],[System.Int32]]",
            "value": {"EMF Reader": 2, "Flashlight": 1}
        },
        "Nested": {"x": 1, "y": [1, 2, 3]}
    })
}

fn sample_bytes() -> Vec<u8> {
    serde_json::to_vec(&sample_save()).expect("sample serializes")
}

fn as_mapping(value: Value) -> Mapping {
    match value {
        Value::Object(mapping) => mapping,
        other => panic!("expected mapping, got {other}"),
    }
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .expect("gzip read");
    out
}

#[test]
fn entry_round_trip_law_holds_for_every_shape() {
    for (key, raw) in as_mapping(sample_save()) {
        let entry = Entry::from_raw(key.clone(), raw.clone());
        assert_eq!(entry.to_raw(), raw, "entry {key} did not round-trip");
    }
}

#[test]
fn wrapped_entries_keep_their_declared_tag() {
    let entry = Entry::from_raw("Money", json!({"__type": "float", "value": 500}));
    assert_eq!(entry.form(), EntryForm::Wrapped);
    assert_eq!(entry.tag(), ValueTag::Float);
    assert_eq!(entry.type_name(), Some("float"));
    assert_eq!(entry.value(), &json!(500));
}

#[test]
fn plain_entries_are_classified() {
    let entry = Entry::from_raw("Ratio", json!(0.5));
    assert_eq!(entry.form(), EntryForm::Plain);
    assert_eq!(entry.tag(), ValueTag::Float);
    assert_eq!(entry.type_name(), None);

    let nested = Entry::from_raw("Nested", json!({"value": 3}));
    assert_eq!(nested.form(), EntryForm::Plain);
    assert_eq!(nested.tag(), ValueTag::Opaque);
}

#[test]
fn integral_float_is_not_narrowed() {
    let entry = Entry::from_raw("fov", json!({"__type": "float", "value": 90.0}));
    let raw = serde_json::to_string(&entry.to_raw()).expect("entry serializes");
    assert_eq!(raw, r#"{"__type":"float","value":90.0}"#);
}

#[test]
fn unedited_document_decodes_back_to_the_same_mapping() {
    let bytes = sample_bytes();
    let mut doc = Document::new(JsonContainerCodec::new(), KEY);
    let loaded = doc.load(bytes).expect("sample loads").to_mapping();

    let saved = doc.save().expect("unedited document saves");
    let decoded = JsonContainerCodec::new()
        .decode(&saved, KEY)
        .expect("saved bytes decode");

    assert_eq!(decoded, loaded);
    assert_eq!(decoded, as_mapping(sample_save()));
    let keys: Vec<&String> = decoded.keys().collect();
    let expected = as_mapping(sample_save());
    let expected_keys: Vec<&String> = expected.keys().collect();
    assert_eq!(keys, expected_keys);
}

#[test]
fn compact_plain_container_is_reproduced_byte_for_byte() {
    let bytes = sample_bytes();
    let mut doc = Document::new(JsonContainerCodec::new(), KEY);
    doc.load(bytes.clone()).expect("sample loads");
    assert_eq!(doc.save().expect("saves"), bytes);
}

#[test]
fn gzip_framing_is_carried_over_from_the_original() {
    let bytes = gzip(&sample_bytes());
    let mut doc = Document::new(JsonContainerCodec::new(), KEY);
    doc.load(bytes).expect("gzip sample loads");

    let saved = doc.save().expect("saves");
    assert_eq!(&saved[..2], &[0x1f, 0x8b]);
    assert_eq!(gunzip(&saved), sample_bytes());
}

#[test]
fn byte_order_mark_is_carried_over_from_the_original() {
    let mut bytes = vec![0xef, 0xbb, 0xbf];
    bytes.extend_from_slice(&sample_bytes());

    let mut doc = Document::new(JsonContainerCodec::new(), KEY);
    doc.load(bytes.clone()).expect("BOM sample loads");
    assert_eq!(doc.save().expect("saves"), bytes);
}

#[test]
fn codec_rejects_non_mapping_and_corrupt_input() {
    let codec = JsonContainerCodec::new();
    assert!(codec.decode(b"[1, 2, 3]", KEY).is_err());
    assert!(codec.decode(b"{\"truncated\": ", KEY).is_err());
    assert!(codec.decode(&[0x1f, 0x8b, 0x00, 0x01], KEY).is_err());
}

#[test]
fn high_precision_floats_survive_an_unedited_save() {
    let bytes = br#"{"sensitivity":100.72768274110031,"tiny":1.079907802215119e-66,"fovValue":{"__type":"float","value":100.72768274110031}}"#.to_vec();
    let mut doc = Document::new(JsonContainerCodec::new(), KEY);
    let raw = doc.load(bytes.clone()).expect("floats load");

    let expected: f64 = "100.72768274110031".parse().expect("valid float");
    assert_eq!(
        raw.get("sensitivity").and_then(|entry| entry.value().as_f64()),
        Some(expected)
    );
    let expected: f64 = "1.079907802215119e-66".parse().expect("valid float");
    assert_eq!(
        raw.get("tiny").and_then(|entry| entry.value().as_f64()),
        Some(expected)
    );

    assert_eq!(doc.save().expect("unedited document saves"), bytes);
}
