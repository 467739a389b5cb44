//! Record and enumeration declarations.
//!
//! `json_record!` and `json_enum!` stand in for reflection: they emit the Rust
//! type together with its lazily built, process-lifetime descriptor and the
//! conversions between the typed and dynamic forms.

use crate::error::ConstructError;
use crate::ir::{EnumType, RecordType};
use crate::value::RecordValue;

/// A struct with a declared record type.
pub trait Record: Sized {
    fn record_type() -> &'static RecordType;

    /// Construct from a record value of this record type.
    fn from_value(value: RecordValue) -> Result<Self, ConstructError>;

    fn to_value(&self) -> RecordValue;
}

/// A fieldless enum with a declared enumeration type.
pub trait Enumeration: Sized + Copy {
    fn enum_type() -> &'static EnumType;

    /// Position of this variant among the declared members.
    fn index(&self) -> usize;

    fn from_index(index: usize) -> Option<Self>;
}

/// Declare a fieldless enum whose members are written as the given wire
/// values (string or integer literals). Derives `Debug`, `Clone`, `Copy`,
/// `PartialEq`, `Eq`, `Hash`.
///
/// ```
/// json_rec::json_enum! {
///     pub enum ReleaseType {
///         Lp = "lp",
///         Cd = "cd",
///         Download = "download",
///     }
/// }
/// ```
#[macro_export]
macro_rules! json_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $wire:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::Enumeration for $name {
            fn enum_type() -> &'static $crate::ir::EnumType {
                static TYPE: $crate::__private::Lazy<$crate::ir::EnumType> =
                    $crate::__private::Lazy::new(|| {
                        $crate::ir::EnumType::new(
                            stringify!($name),
                            vec![$($crate::ir::Member::new(stringify!($variant), $wire)),+],
                        )
                    });
                &TYPE
            }

            fn index(&self) -> usize {
                *self as usize
            }

            fn from_index(index: usize) -> Option<Self> {
                const VARIANTS: &[$name] = &[$($name::$variant),+];
                VARIANTS.get(index).copied()
            }
        }

        impl $crate::value::Typed for $name {
            fn ty() -> $crate::ir::Ty {
                $crate::ir::Ty::Enum(<Self as $crate::Enumeration>::enum_type())
            }
        }

        impl $crate::value::FromVal for $name {
            fn from_val(val: $crate::value::Val) -> Result<Self, $crate::error::ConstructError> {
                let expected = <Self as $crate::value::Typed>::ty();
                match val {
                    $crate::value::Val::Enum(e)
                        if ::std::ptr::eq(e.enum_type(), <Self as $crate::Enumeration>::enum_type()) =>
                    {
                        <Self as $crate::Enumeration>::from_index(e.index())
                            .ok_or_else(|| $crate::error::ConstructError::new(expected, "enum"))
                    }
                    other => Err($crate::error::ConstructError::new(expected, other.kind())),
                }
            }
        }

        impl $crate::value::ToVal for $name {
            fn to_val(&self) -> $crate::value::Val {
                $crate::value::Val::Enum($crate::value::EnumValue::of(self))
            }
        }
    };
}

/// Declare a struct with a record type built from its fields' `Typed` impls,
/// in declaration order. Field types must implement `Typed`, `FromVal` and
/// `ToVal`.
///
/// ```
/// json_rec::json_record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Response {
///         pub message: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! json_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($fvis:vis $field:ident : $fty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $fty),*
        }

        impl $crate::Record for $name {
            fn record_type() -> &'static $crate::ir::RecordType {
                static TYPE: $crate::__private::Lazy<$crate::ir::RecordType> =
                    $crate::__private::Lazy::new(|| {
                        $crate::ir::RecordType::new(
                            stringify!($name),
                            vec![$($crate::ir::Field::new(
                                stringify!($field),
                                <$fty as $crate::value::Typed>::ty(),
                            )),*],
                        )
                    });
                &TYPE
            }

            #[allow(unused_mut, unused_variables)]
            fn from_value(value: $crate::value::RecordValue) -> Result<Self, $crate::error::ConstructError> {
                let mut fields = value.into_fields();
                Ok(Self {
                    $($field: {
                        let val = fields.shift_remove(stringify!($field)).ok_or_else(|| {
                            $crate::error::ConstructError::new(
                                <$fty as $crate::value::Typed>::ty(),
                                "missing",
                            )
                            .in_field(stringify!($field))
                        })?;
                        <$fty as $crate::value::FromVal>::from_val(val)
                            .map_err(|e| e.in_field(stringify!($field)))?
                    },)*
                })
            }

            #[allow(unused_mut)]
            fn to_value(&self) -> $crate::value::RecordValue {
                let mut fields = $crate::__private::IndexMap::new();
                $(fields.insert(
                    stringify!($field).to_string(),
                    $crate::value::ToVal::to_val(&self.$field),
                );)*
                $crate::value::RecordValue::from_ordered(<Self as $crate::Record>::record_type(), fields)
            }
        }

        impl $crate::value::Typed for $name {
            fn ty() -> $crate::ir::Ty {
                $crate::ir::Ty::Record(<Self as $crate::Record>::record_type())
            }
        }

        impl $crate::value::FromVal for $name {
            fn from_val(val: $crate::value::Val) -> Result<Self, $crate::error::ConstructError> {
                match val {
                    $crate::value::Val::Record(rv)
                        if ::std::ptr::eq(rv.record_type(), <Self as $crate::Record>::record_type()) =>
                    {
                        <Self as $crate::Record>::from_value(rv)
                    }
                    other => Err($crate::error::ConstructError::new(
                        <Self as $crate::value::Typed>::ty(),
                        other.kind(),
                    )),
                }
            }
        }

        impl $crate::value::ToVal for $name {
            fn to_val(&self) -> $crate::value::Val {
                $crate::value::Val::Record(<Self as $crate::Record>::to_value(self))
            }
        }
    };
}
