//! Type-directed mapping between declared record types and JSON.
//!
//! Records and enums are declared with [`json_record!`] and [`json_enum!`]
//! (or loaded at runtime from a [`schema`] file). Decoding validates every
//! field against its declared [`ir::Ty`]; encoding dispatches on the runtime
//! kind of each value. [`adapter::adapt`] turns a function over one record
//! type into a map-in/map-out function.
//!
//! ```
//! use json_rec::{json_enum, json_record};
//!
//! json_enum! {
//!     pub enum ReleaseType { Lp = "lp", Cd = "cd", Download = "download" }
//! }
//!
//! json_record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Album {
//!         pub artist: String,
//!         pub release_type: ReleaseType,
//!         pub release_date: Option<chrono::NaiveDate>,
//!     }
//! }
//!
//! let album: Album = json_rec::from_json(r#"{"artist": "Destroyer", "release_type": "lp"}"#).unwrap();
//! assert_eq!(album.release_date, None);
//! assert_eq!(
//!     json_rec::to_json(&album).unwrap(),
//!     r#"{"artist":"Destroyer","release_type":"lp","release_date":null}"#
//! );
//! ```

pub mod adapter;
pub mod classify;
pub mod codec;
pub mod de;
pub mod declare;
pub mod error;
pub mod ir;
pub mod schema;
pub mod ser;
pub mod value;

pub use adapter::{adapt, Adapter, Handler};
pub use codec::{decode, decode_record, encode, encode_record, from_json, to_json, to_json_pretty, to_plain_map};
pub use declare::{Enumeration, Record};
pub use error::{AdaptError, ConfigError, ConstructError, Error, SerializeError, ValidationError};
pub use ser::Serializable;

#[doc(hidden)]
pub mod __private {
    pub use indexmap::IndexMap;
    pub use once_cell::sync::Lazy;
}
