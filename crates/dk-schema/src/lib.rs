//! Schema model and value conversion for the DocKit API playground.
//!
//! This crate holds the leaf dependencies of the request-building core:
//!
//! - [`Schema`] and the [`ReferenceTable`], a declarative description of
//!   expected value shapes with named, possibly cyclic references
//! - [`DynamicFields`], externally supplied path-to-schema bindings for
//!   fields whose schema is only known at runtime (switcher fields,
//!   open-ended additional properties)
//! - [`FieldValue`] / [`Normalized`], the raw form input and the
//!   converted output shapes
//! - [`convert`], the recursive schema-driven value conversion
//!
//! Body encoding and request execution live in `dk-playground`.

mod convert;
mod schema;
mod value;

pub use convert::{Conversion, ConvertError, convert};
pub use schema::{
    DynamicField, DynamicFields, ReferenceTable, Schema, SchemaKind, resolve, resolve_chain,
};
pub use value::{FieldValue, FileHandle, FileInJson, Normalized};
