use std::io::Write;

use json_rec::codec;
use json_rec::schema::{Schema, SchemaError};
use json_rec::value::Val;
use pretty_assertions::assert_eq;

const SCHEMA: &str = r#"{
    "root": "Release",
    "enums": {
        "ReleaseType": ["lp", "cd", "download"],
        "Speed": [{"name": "slow", "value": 33}, {"name": "fast", "value": 45}]
    },
    "records": {
        "Release": [
            {"name": "artist", "type": "string"},
            {"name": "title", "type": "string"},
            {"name": "release_type", "type": "ReleaseType"},
            {"name": "release_date", "type": "date?"},
            {"name": "speed", "type": "Speed | null"}
        ]
    }
}"#;

fn schema_on_disk() -> (tempfile::NamedTempFile, Schema) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCHEMA.as_bytes()).unwrap();
    let schema = Schema::load(file.path()).unwrap();
    (file, schema)
}

#[test]
fn runtime_schema_decodes_and_normalizes() {
    let (_file, schema) = schema_on_disk();
    let release = schema.root(None).unwrap();

    let value = codec::decode_str(
        release,
        r#"{"speed": 45, "title": "Have We Met", "artist": "Destroyer", "release_type": "lp", "extra": true}"#,
    )
    .unwrap();
    let Some(Val::Enum(speed)) = value.get("speed") else {
        panic!("speed should decode to an enum member");
    };
    assert_eq!(speed.name(), "fast");

    let text = serde_json::to_string(&codec::encode(&value).unwrap()).unwrap();
    assert_eq!(
        text,
        r#"{"artist":"Destroyer","title":"Have We Met","release_type":"lp","release_date":null,"speed":45}"#
    );
}

#[test]
fn integer_enums_reject_unknown_numbers() {
    let (_file, schema) = schema_on_disk();
    let release = schema.root(None).unwrap();
    let err = codec::decode_str(
        release,
        r#"{"title": "T", "artist": "A", "release_type": "cd", "speed": 78}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("78"), "{err}");
    assert!(err.to_string().contains("Speed"), "{err}");
}

#[test]
fn missing_schema_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Schema::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Read { .. }), "{err}");
}
