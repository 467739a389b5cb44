//! In-memory values produced by decoding and consumed by encoding.
//!
//! `Val` is the dynamic form of a field value. Typed records convert to and
//! from it through `FromVal` / `ToVal`; the declared type of a Rust field type
//! comes from `Typed`.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::declare::Enumeration;
use crate::error::ConstructError;
use crate::ir::{EnumType, Member, RecordType, Ty, Wire};

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Date(NaiveDate),
    Enum(EnumValue),
    Record(RecordValue),
    Ext(Extension),
}

impl Val {
    pub fn kind(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "bool",
            Val::Int(_) => "int",
            Val::Str(_) => "string",
            Val::Date(_) => "date",
            Val::Enum(_) => "enum",
            Val::Record(_) => "record",
            Val::Ext(ext) => ext.kind(),
        }
    }
}

/// Observed kind of a raw JSON value, as reported in validation failures.
pub fn json_kind(raw: Option<&Json>) -> &'static str {
    match raw {
        None => "missing",
        Some(Json::Null) => "null",
        Some(Json::Bool(_)) => "bool",
        Some(Json::Number(_)) => "number",
        Some(Json::String(_)) => "string",
        Some(Json::Array(_)) => "array",
        Some(Json::Object(_)) => "object",
    }
}

// ------------------------------- Enums ------------------------------------ //

/// One member of a declared enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    ty: &'static EnumType,
    index: usize,
}

impl EnumValue {
    pub fn from_wire(ty: &'static EnumType, wire: &Wire) -> Option<Self> {
        ty.position(wire).map(|index| Self { ty, index })
    }

    pub fn of<E: Enumeration>(variant: &E) -> Self {
        Self { ty: E::enum_type(), index: variant.index() }
    }

    pub fn enum_type(&self) -> &'static EnumType {
        self.ty
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn member(&self) -> &'static Member {
        &self.ty.members[self.index]
    }

    pub fn name(&self) -> &'static str {
        &self.member().name
    }

    pub fn wire(&self) -> &'static Wire {
        &self.member().value
    }
}

// ------------------------------ Records ----------------------------------- //

/// A fully populated record: one value per declared field, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    ty: &'static RecordType,
    fields: IndexMap<String, Val>,
}

impl RecordValue {
    /// Build from named values. Every declared field must be supplied and
    /// nothing else; the result is reordered to declaration order.
    pub fn new(ty: &'static RecordType, mut values: IndexMap<String, Val>) -> Result<Self, ConstructError> {
        let mut fields = IndexMap::with_capacity(ty.fields.len());
        for field in &ty.fields {
            let Some(val) = values.shift_remove(&field.name) else {
                return Err(ConstructError::new(&field.ty, "missing").in_field(&field.name));
            };
            fields.insert(field.name.clone(), val);
        }
        if let Some((name, val)) = values.into_iter().next() {
            return Err(ConstructError::new(format!("no field `{name}` on {}", ty.name), val.kind())
                .in_field(&name));
        }
        Ok(Self { ty, fields })
    }

    /// Caller guarantees `fields` follows `ty.fields` exactly.
    #[doc(hidden)]
    pub fn from_ordered(ty: &'static RecordType, fields: IndexMap<String, Val>) -> Self {
        debug_assert!(ty.fields.iter().map(|f| &f.name).eq(fields.keys()));
        Self { ty, fields }
    }

    pub fn record_type(&self) -> &'static RecordType {
        self.ty
    }

    pub fn get(&self, name: &str) -> Option<&Val> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Val)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_fields(self) -> IndexMap<String, Val> {
        self.fields
    }
}

// ----------------------------- Extensions --------------------------------- //

/// A value of a kind outside the built-in set. Serializes only through a
/// registered serializer (see `ser::Registry`).
#[derive(Clone)]
pub struct Extension {
    kind: &'static str,
    type_id: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

impl Extension {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            kind: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub(crate) fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }
}

impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Extension").field(&self.kind).finish()
    }
}

// ------------------------------ Traits ------------------------------------ //

/// Rust types with a declared JSON type.
pub trait Typed {
    fn ty() -> Ty;
}

pub trait FromVal: Sized {
    fn from_val(val: Val) -> Result<Self, ConstructError>;
}

pub trait ToVal {
    fn to_val(&self) -> Val;
}

macro_rules! impl_primitive {
    ($rust:ty, $ty:expr, $variant:ident) => {
        impl Typed for $rust {
            fn ty() -> Ty {
                $ty
            }
        }

        impl FromVal for $rust {
            fn from_val(val: Val) -> Result<Self, ConstructError> {
                match val {
                    Val::$variant(v) => Ok(v),
                    other => Err(ConstructError::new($ty, other.kind())),
                }
            }
        }

        impl ToVal for $rust {
            fn to_val(&self) -> Val {
                Val::$variant(self.clone())
            }
        }
    };
}

impl_primitive!(String, Ty::Str, Str);
impl_primitive!(i64, Ty::Int, Int);
impl_primitive!(bool, Ty::Bool, Bool);
impl_primitive!(NaiveDate, Ty::Date, Date);

impl Typed for () {
    fn ty() -> Ty {
        Ty::Null
    }
}

impl FromVal for () {
    fn from_val(val: Val) -> Result<Self, ConstructError> {
        match val {
            Val::Null => Ok(()),
            other => Err(ConstructError::new(Ty::Null, other.kind())),
        }
    }
}

impl ToVal for () {
    fn to_val(&self) -> Val {
        Val::Null
    }
}

impl<T: Typed> Typed for Option<T> {
    fn ty() -> Ty {
        Ty::optional(T::ty())
    }
}

impl<T: FromVal> FromVal for Option<T> {
    fn from_val(val: Val) -> Result<Self, ConstructError> {
        match val {
            Val::Null => Ok(None),
            other => T::from_val(other).map(Some),
        }
    }
}

impl<T: ToVal> ToVal for Option<T> {
    fn to_val(&self) -> Val {
        match self {
            Some(v) => v.to_val(),
            None => Val::Null,
        }
    }
}
