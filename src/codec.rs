//! Record codec: whole records to and from JSON maps and text.

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::de::deserialize;
use crate::declare::Record;
use crate::error::{Error, SerializeError, ValidationError};
use crate::ir::RecordType;
use crate::ser::{serialize, Serializable};
use crate::value::{json_kind, RecordValue, Val};

/// Decode every declared field of `ty` from `map`, in declaration order.
/// Keys `ty` does not declare are ignored; the first failure aborts.
pub fn decode(ty: &'static RecordType, map: &Map<String, Json>) -> Result<RecordValue, ValidationError> {
    let mut fields = IndexMap::with_capacity(ty.fields.len());
    for field in &ty.fields {
        let val = deserialize(&field.ty, map.get(&field.name), &field.name)?;
        fields.insert(field.name.clone(), val);
    }
    tracing::trace!(record = %ty.name, fields = fields.len(), "decoded record");
    Ok(RecordValue::from_ordered(ty, fields))
}

/// Serialize every field, in declaration order. Null fields stay as `null`.
pub fn encode(record: &RecordValue) -> Result<Map<String, Json>, SerializeError> {
    let mut out = Map::new();
    for (name, val) in record.iter() {
        out.insert(name.to_string(), serialize(val)?);
    }
    Ok(out)
}

/// Structural flattening of an already-built record: nested records become
/// maps, leaves go straight to their own `Serializable` impl.
pub fn to_plain_map(record: &RecordValue) -> Result<Map<String, Json>, SerializeError> {
    let mut out = Map::new();
    for (name, val) in record.iter() {
        out.insert(name.to_string(), plain(val)?);
    }
    Ok(out)
}

fn plain(val: &Val) -> Result<Json, SerializeError> {
    match val {
        Val::Record(r) => to_plain_map(r).map(Json::Object),
        Val::Null => Ok(Json::Null),
        Val::Bool(b) => Ok(Json::Bool(*b)),
        Val::Int(n) => Ok(Json::from(*n)),
        Val::Str(s) => Ok(Json::String(s.clone())),
        Val::Date(d) => d.to_json(),
        Val::Enum(e) => e.to_json(),
        Val::Ext(ext) => ext.to_json(),
    }
}

// ------------------------------ Typed ------------------------------------- //

pub fn decode_record<R: Record>(map: &Map<String, Json>) -> Result<R, Error> {
    let value = decode(R::record_type(), map)?;
    Ok(R::from_value(value)?)
}

pub fn encode_record<R: Record>(record: &R) -> Result<Map<String, Json>, SerializeError> {
    encode(&record.to_value())
}

pub fn record_to_plain_map<R: Record>(record: &R) -> Result<Map<String, Json>, SerializeError> {
    to_plain_map(&record.to_value())
}

// ------------------------------- Text ------------------------------------- //

/// Parse JSON text that must hold a single object.
pub fn parse_object(text: &str) -> Result<Map<String, Json>, Error> {
    let de = &mut serde_json::Deserializer::from_str(text);
    let json: Json = serde_path_to_error::deserialize(de)?;
    match json {
        Json::Object(map) => Ok(map),
        other => Err(Error::NotAnObject { observed: json_kind(Some(&other)) }),
    }
}

pub fn decode_str(ty: &'static RecordType, text: &str) -> Result<RecordValue, Error> {
    Ok(decode(ty, &parse_object(text)?)?)
}

pub fn from_json<R: Record>(text: &str) -> Result<R, Error> {
    decode_record(&parse_object(text)?)
}

pub fn to_json<R: Record>(record: &R) -> Result<String, Error> {
    let map = encode_record(record)?;
    serde_json::to_string(&map).map_err(Error::Encode)
}

pub fn to_json_pretty<R: Record>(record: &R) -> Result<String, Error> {
    let map = encode_record(record)?;
    serde_json::to_string_pretty(&map).map_err(Error::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, Ty};
    use once_cell::sync::Lazy;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    static TRACK: Lazy<RecordType> = Lazy::new(|| {
        RecordType::new(
            "Track",
            vec![
                Field::new("title", Ty::Str),
                Field::new("seconds", Ty::Int),
                Field::new("explicit", Ty::optional(Ty::Bool)),
            ],
        )
    });

    fn obj(v: Json) -> Map<String, Json> {
        match v {
            Json::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn decode_ignores_unknown_keys_and_fills_nulls() {
        let rv = decode(&TRACK, &obj(json!({"seconds": 212, "title": "Kinda Bonita", "extra": 1}))).unwrap();
        assert_eq!(rv.get("explicit"), Some(&Val::Null));
        assert!(rv.get("extra").is_none());

        let out = encode(&rv).unwrap();
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"title":"Kinda Bonita","seconds":212,"explicit":null}"#
        );
    }

    #[test]
    fn decode_stops_at_first_failing_field() {
        let err = decode(&TRACK, &obj(json!({"title": 1, "seconds": "x"}))).unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn plain_map_matches_encode() {
        let rv = decode(&TRACK, &obj(json!({"title": "t", "seconds": 1, "explicit": true}))).unwrap();
        assert_eq!(to_plain_map(&rv).unwrap(), encode(&rv).unwrap());
    }

    #[test]
    fn text_must_be_an_object() {
        assert!(matches!(decode_str(&TRACK, "[1, 2]"), Err(Error::NotAnObject { observed: "array" })));
        let err = decode_str(&TRACK, r#"{"title": "t", "seconds": }"#).unwrap_err();
        assert!(matches!(err, Error::Json { .. }), "{err}");
    }
}
