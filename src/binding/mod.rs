//! # Binding Module
//!
//! Tag-driven binding of query, path and header parameters into typed
//! handler inputs.
//!
//! ## Overview
//!
//! A handler input is a plain struct deriving [`Bind`](crate::Bind). Every
//! field attribute becomes a static [`Tags`] table:
//!
//! ```rust,ignore
//! #[derive(Default, Bind)]
//! struct ListPets {
//!     #[bind(query = "limit", default = "20")]
//!     limit: u32,
//!     #[bind(query = "sort", enum = "asc,desc")]
//!     sort: Option<String>,
//!     #[bind(path = "owner")]
//!     owner: String,
//! }
//! ```
//!
//! [`bind`] walks those fields for one location tag at a time. An
//! [`Extractor`] pulls the raw strings from a [`RequestFacade`], the binder
//! applies defaults, cardinality and enum rules, and the field's [`Target`]
//! converts the text through [`FromParam`].
//!
//! ## Tag vocabulary
//!
//! - `query`, `path`, `header`: `"<name>[,required][,default=<v>]"`
//! - `enum`: comma-separated accepted values (scalars only)
//! - `explode`: `"false"` splits a single query value on commas
//! - `default`: value used when nothing was extracted
//! - `validate`: rules checked by [`crate::validation`] after binding

mod binder;
mod coerce;
mod error;
mod extract;
mod model;
mod slot;
mod tag;
#[cfg(test)]
pub(crate) mod testing;

pub use binder::{bind, explode_flag};
pub use coerce::{bind_string_value, parse_duration, CoerceError, FromParam, ParamSchema};
pub use error::{BindError, BindErrorKind};
pub use extract::{
    extract_header, extract_path, extract_query, ExtractError, Extracted, Extractor, Location,
    RequestFacade,
};
pub use model::{Bindable, FieldMut, FieldRef};
pub use slot::{
    optional_slot, slot, unaddressable_slot, unsupported_slot, FixedArray, Layout, Scalar,
    Sequence, Shape, Target,
};
pub use tag::{
    parse_tag_key, parse_tag_name, TagError, TagKey, Tags, DEFAULT_TAG, ENUM_TAG, EXPLODE_TAG,
    HEADER_TAG, PATH_TAG, QUERY_TAG, REQUIRED_TAG, VALIDATION_TAG,
};
