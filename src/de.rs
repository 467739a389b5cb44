//! Type-directed validation of raw JSON values.
//!
//! Exact-kind matching only: a JSON number is never accepted for a string
//! field, and vice versa. Unions try their members in declaration order.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;

use crate::classify::{classify, Kind, Primitive};
use crate::error::ValidationError;
use crate::ir::{EnumType, Ty, Wire};
use crate::value::{json_kind, EnumValue, Val};

static CALENDAR_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Validate `raw` against `ty` and produce its in-memory value.
/// A missing value (`None`) is treated as JSON null.
pub fn deserialize(ty: &Ty, raw: Option<&Json>, field: &str) -> Result<Val, ValidationError> {
    let mismatch = || ValidationError::new(field, json_kind(raw), ty);
    let raw_or_null = raw.unwrap_or(&Json::Null);

    match classify(ty) {
        Kind::Primitive(p) => primitive(p, raw_or_null).ok_or_else(mismatch),
        Kind::Date => match raw_or_null {
            Json::String(s) => parse_date(s).ok_or_else(|| {
                mismatch().with_detail(format!("{s:?} is not a YYYY-MM-DD calendar date"))
            }),
            _ => Err(mismatch()),
        },
        Kind::Enum(e) => enumerated(e, raw_or_null).ok_or_else(|| {
            mismatch().with_detail(format!("{raw_or_null} is not a valid {}", e.name))
        }),
        Kind::Union(arms) => union(arms, raw, field).map_err(|err| err.unwrap_or_else(mismatch)),
        Kind::Record(rt) => match raw_or_null {
            Json::Object(map) => crate::codec::decode(rt, map)
                .map(Val::Record)
                .map_err(|err| err.under(field)),
            _ => Err(mismatch()),
        },
        Kind::Unsupported(_) => Err(mismatch().with_detail("type is not supported for decoding")),
    }
}

fn primitive(p: Primitive, raw: &Json) -> Option<Val> {
    match (p, raw) {
        (Primitive::Str, Json::String(s)) => Some(Val::Str(s.clone())),
        (Primitive::Int, Json::Number(n)) => n.as_i64().map(Val::Int),
        (Primitive::Bool, Json::Bool(b)) => Some(Val::Bool(*b)),
        (Primitive::Null, Json::Null) => Some(Val::Null),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<Val> {
    if !CALENDAR_DATE.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Val::Date)
}

fn enumerated(e: &'static EnumType, raw: &Json) -> Option<Val> {
    let wire = match raw {
        Json::String(s) => Wire::Str(s.clone()),
        Json::Number(n) => Wire::Int(n.as_i64()?),
        _ => return None,
    };
    EnumValue::from_wire(e, &wire).map(Val::Enum)
}

/// First accepting member wins. On total failure, report the first non-null
/// member's failure; `Err(None)` only for an empty union.
fn union(arms: &[Ty], raw: Option<&Json>, field: &str) -> Result<Val, Option<ValidationError>> {
    let mut first_non_null: Option<ValidationError> = None;
    let mut last: Option<ValidationError> = None;
    for arm in arms {
        match deserialize(arm, raw, field) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if first_non_null.is_none() && !arm.is_null() {
                    first_non_null = Some(err.clone());
                }
                last = Some(err);
            }
        }
    }
    Err(first_non_null.or(last))
}
