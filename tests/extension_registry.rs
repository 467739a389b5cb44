//! Installs the process-wide serializer registry, so it lives in its own test
//! binary and runs as a single test.

use json_rec::ser::{self, Registry};
use json_rec::value::{Extension, ToVal, Typed, Val};
use json_rec::ir::Ty;
use json_rec::json_record;
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub cents: i64,
    pub currency: &'static str,
}

impl Typed for Money {
    fn ty() -> Ty {
        Ty::Opaque("Money")
    }
}

impl ToVal for Money {
    fn to_val(&self) -> Val {
        Val::Ext(Extension::new(self.clone()))
    }
}

impl json_rec::value::FromVal for Money {
    fn from_val(val: Val) -> Result<Self, json_rec::ConstructError> {
        match val {
            Val::Ext(ext) => ext
                .downcast_ref::<Money>()
                .cloned()
                .ok_or_else(|| json_rec::ConstructError::new(Money::ty(), ext.kind())),
            other => Err(json_rec::ConstructError::new(Money::ty(), other.kind())),
        }
    }
}

#[derive(Debug)]
pub struct Unlisted;

json_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Price {
        pub sku: String,
        pub amount: Money,
    }
}

#[test]
fn registered_kinds_serialize_and_registry_freezes() {
    let registry = Registry::new().register::<Money>(|m| {
        json!(format!("{}.{:02} {}", m.cents / 100, m.cents % 100, m.currency))
    });
    assert!(registry.contains::<Money>());
    ser::install(registry).unwrap_or_else(|_| panic!("registry was already frozen"));

    let price = Price {
        sku: "MRG-700".into(),
        amount: Money { cents: 2499, currency: "USD" },
    };
    let map = json_rec::encode_record(&price).unwrap();
    assert_eq!(map["amount"], json!("24.99 USD"));

    let err = ser::serialize(&Val::Ext(Extension::new(Unlisted))).unwrap_err();
    assert!(err.to_string().contains("Unlisted"), "{err}");

    assert!(ser::install(Registry::new()).is_err());
}
