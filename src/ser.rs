//! Serialization by runtime value kind.
//!
//! Built-in kinds (primitives, dates, enum members, records) implement
//! `Serializable` directly. Any other kind travels as an `Extension` and must
//! have a serializer in the process-wide `Registry`; there is no string
//! fallback.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::OnceCell;
use serde_json::Value as Json;

use crate::error::SerializeError;
use crate::ir::Wire;
use crate::value::{EnumValue, Extension, RecordValue, Val};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait Serializable {
    fn to_json(&self) -> Result<Json, SerializeError>;
}

/// Dispatch on the runtime kind of `value`.
pub fn serialize(value: &Val) -> Result<Json, SerializeError> {
    match value {
        Val::Null => Ok(Json::Null),
        Val::Bool(b) => Ok(Json::Bool(*b)),
        Val::Int(n) => Ok(Json::from(*n)),
        Val::Str(s) => Ok(Json::String(s.clone())),
        Val::Date(d) => d.to_json(),
        Val::Enum(e) => e.to_json(),
        Val::Record(r) => r.to_json(),
        Val::Ext(ext) => ext.to_json(),
    }
}

impl Serializable for Val {
    fn to_json(&self) -> Result<Json, SerializeError> {
        serialize(self)
    }
}

impl Serializable for NaiveDate {
    fn to_json(&self) -> Result<Json, SerializeError> {
        // `%Y` signs and widens years past four digits
        if !(0..=9999).contains(&self.year()) {
            return Err(SerializeError::DateOutOfRange { date: *self });
        }
        Ok(Json::String(self.format(DATE_FORMAT).to_string()))
    }
}

impl Serializable for Wire {
    fn to_json(&self) -> Result<Json, SerializeError> {
        Ok(match self {
            Wire::Str(s) => Json::String(s.clone()),
            Wire::Int(n) => Json::from(*n),
        })
    }
}

impl Serializable for EnumValue {
    fn to_json(&self) -> Result<Json, SerializeError> {
        self.wire().to_json()
    }
}

impl Serializable for RecordValue {
    fn to_json(&self) -> Result<Json, SerializeError> {
        crate::codec::encode(self).map(Json::Object)
    }
}

impl Serializable for Extension {
    fn to_json(&self) -> Result<Json, SerializeError> {
        registry().serialize(self)
    }
}

// ------------------------------ Registry ---------------------------------- //

type SerializeFn = Box<dyn Fn(&dyn Any) -> Option<Json> + Send + Sync>;

/// Serializers for extension kinds, keyed by Rust type.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<TypeId, SerializeFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Any>(mut self, f: fn(&T) -> Json) -> Self {
        let entry: SerializeFn = Box::new(move |any| any.downcast_ref::<T>().map(f));
        self.entries.insert(TypeId::of::<T>(), entry);
        self
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    fn serialize(&self, ext: &Extension) -> Result<Json, SerializeError> {
        let unregistered = || SerializeError::Unregistered { kind: ext.kind() };
        let entry = self.entries.get(&ext.type_id()).ok_or_else(unregistered)?;
        entry(ext.as_any()).ok_or_else(unregistered)
    }
}

static REGISTRY: OnceCell<Registry> = OnceCell::new();

/// Install the process-wide registry. Must run before the first
/// serialization; once frozen, the registry is handed back unchanged.
pub fn install(registry: Registry) -> Result<(), Registry> {
    let count = registry.entries.len();
    REGISTRY.set(registry)?;
    tracing::debug!(count, "installed extension serializers");
    Ok(())
}

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Unknown;

    #[test]
    fn primitives_serialize_as_themselves() {
        assert_eq!(serialize(&Val::Null).unwrap(), Json::Null);
        assert_eq!(serialize(&Val::Int(-4)).unwrap(), Json::from(-4));
        assert_eq!(serialize(&Val::Str("a".into())).unwrap(), Json::from("a"));
        assert_eq!(serialize(&Val::Bool(true)).unwrap(), Json::Bool(true));
    }

    #[test]
    fn dates_use_calendar_form() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 7).unwrap();
        assert_eq!(serialize(&Val::Date(d)).unwrap(), Json::from("2020-03-07"));
        let d = NaiveDate::from_ymd_opt(12, 1, 5).unwrap();
        assert_eq!(serialize(&Val::Date(d)).unwrap(), Json::from("0012-01-05"));
    }

    #[test]
    fn dates_outside_four_digit_years_are_rejected() {
        for year in [10000, -1] {
            let date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
            assert_eq!(
                serialize(&Val::Date(date)),
                Err(SerializeError::DateOutOfRange { date })
            );
        }
    }

    #[test]
    fn unregistered_kind_is_an_error() {
        let err = serialize(&Val::Ext(Extension::new(Unknown))).unwrap_err();
        let kind = match err {
            SerializeError::Unregistered { kind } => kind,
            other => panic!("expected an unregistered kind, got {other:?}"),
        };
        assert!(kind.ends_with("Unknown"), "{kind}");
    }

    #[test]
    fn registry_entries_are_keyed_by_type() {
        let reg = Registry::new().register::<u8>(|n| Json::from(*n));
        assert!(reg.contains::<u8>());
        assert!(!reg.contains::<u16>());
        assert_eq!(reg.serialize(&Extension::new(9u8)).unwrap(), Json::from(9));
        assert!(reg.serialize(&Extension::new(9u16)).is_err());
    }
}
