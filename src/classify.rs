use crate::ir::{EnumType, RecordType, Ty};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Str,
    Int,
    Bool,
    Null,
}

/// Structural kind of a declared type, borrowing whatever the kind needs to
/// act on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind<'a> {
    Primitive(Primitive),
    Date,
    Enum(&'static EnumType),
    Union(&'a [Ty]),
    Record(&'static RecordType),
    Unsupported(&'static str),
}

pub fn classify(ty: &Ty) -> Kind<'_> {
    match ty {
        Ty::Str => Kind::Primitive(Primitive::Str),
        Ty::Int => Kind::Primitive(Primitive::Int),
        Ty::Bool => Kind::Primitive(Primitive::Bool),
        Ty::Null => Kind::Primitive(Primitive::Null),
        Ty::Date => Kind::Date,
        Ty::Enum(e) => Kind::Enum(*e),
        Ty::Record(rt) => Kind::Record(*rt),
        Ty::OneOf(arms) => Kind::Union(arms),
        Ty::Opaque(name) => Kind::Unsupported(*name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_is_a_union() {
        let optional = Ty::optional(Ty::Date);
        let Kind::Union(arms) = classify(&optional) else {
            panic!("optional should classify as a union");
        };
        assert_eq!(arms, [Ty::Date, Ty::Null]);
        assert_eq!(classify(&Ty::Null), Kind::Primitive(Primitive::Null));
        assert_eq!(classify(&Ty::Opaque("Cover")), Kind::Unsupported("Cover"));
    }
}
