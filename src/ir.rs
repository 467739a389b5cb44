// Declared-type IR. Built once per record/enum declaration, never mutated.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Str,
    Int,
    Bool,
    Null,                          // exactly null (or a missing key)
    Date,                          // ISO-8601 calendar date, `YYYY-MM-DD`
    Enum(&'static EnumType),
    Record(&'static RecordType),
    OneOf(Vec<Ty>),                // ordered; first accepting member wins
    Opaque(&'static str),          // unsupported kind, carries the Rust type name
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,        // declaration order
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub value: Wire,
}

/// Underlying value an enum member is written as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Wire {
    Str(String),
    Int(i64),
}

impl Ty {
    /// `T | null`
    pub fn optional(inner: Ty) -> Ty {
        Ty::OneOf(vec![inner, Ty::Null])
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Ty::Null)
    }
}

impl RecordType {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self { name: name.into(), fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self { name: name.into(), ty }
    }
}

impl EnumType {
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self { name: name.into(), members }
    }

    pub fn position(&self, wire: &Wire) -> Option<usize> {
        self.members.iter().position(|m| &m.value == wire)
    }
}

impl Member {
    pub fn new(name: impl Into<String>, value: impl Into<Wire>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

impl From<&str> for Wire {
    fn from(s: &str) -> Self {
        Wire::Str(s.to_string())
    }
}

impl From<String> for Wire {
    fn from(s: String) -> Self {
        Wire::Str(s)
    }
}

// i32 so that bare integer literals in `json_enum!` resolve without a suffix.
impl From<i32> for Wire {
    fn from(n: i32) -> Self {
        Wire::Int(n as i64)
    }
}

impl From<i64> for Wire {
    fn from(n: i64) -> Self {
        Wire::Int(n)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Str => f.write_str("string"),
            Ty::Int => f.write_str("int"),
            Ty::Bool => f.write_str("bool"),
            Ty::Null => f.write_str("null"),
            Ty::Date => f.write_str("date"),
            Ty::Enum(e) => write!(f, "enum {}", e.name),
            Ty::Record(r) => write!(f, "record {}", r.name),
            Ty::OneOf(arms) => {
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{arm}")?;
                }
                Ok(())
            }
            Ty::Opaque(name) => write!(f, "opaque {name}"),
        }
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wire::Str(s) => write!(f, "{s:?}"),
            Wire::Int(n) => write!(f, "{n}"),
        }
    }
}
