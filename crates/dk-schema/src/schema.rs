//! Schema model and reference resolution.
//!
//! A [`Schema`] describes the expected shape of one playground form value.
//! Schemas arrive from an OpenAPI-derived collaborator together with a
//! [`ReferenceTable`]; this crate never parses OpenAPI documents itself.
//!
//! Named references are dereferenced against the table with [`resolve`]
//! (exactly one hop) or [`resolve_chain`] (follows a finite chain of
//! reference-only schemas). The table may describe cyclic *structures*,
//! a schema reaching itself through object properties or array items;
//! that is fine because value conversion recurses over the input value,
//! whose depth is finite.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// The declared shape of an expected value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Mapping of field name to nested schema. `additional` allows keys
    /// beyond the declared properties, resolved through dynamic fields.
    Object {
        properties: BTreeMap<String, Schema>,
        #[serde(default)]
        additional: bool,
    },
    /// Ordered sequence with a single element schema.
    Array(Box<Schema>),
    /// Text value.
    String,
    /// Numeric value.
    Number,
    /// Boolean value.
    Boolean,
    /// Opaque binary payload (file upload).
    File,
    /// Schema determined at runtime per field path; resolved through the
    /// dynamic-field map.
    Switcher,
    /// No declared type; values pass through unconverted.
    Null,
    /// Named pointer into the reference table.
    Reference(String),
}

/// Expected value shape plus the required flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub kind: SchemaKind,
    #[serde(default)]
    pub required: bool,
}

impl Schema {
    /// Create an optional schema of the given kind.
    #[must_use]
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }

    /// Mark this schema as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Text schema.
    #[must_use]
    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    /// Numeric schema.
    #[must_use]
    pub fn number() -> Self {
        Self::new(SchemaKind::Number)
    }

    /// Boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    /// File upload schema.
    #[must_use]
    pub fn file() -> Self {
        Self::new(SchemaKind::File)
    }

    /// Late-bound schema resolved through dynamic fields.
    #[must_use]
    pub fn switcher() -> Self {
        Self::new(SchemaKind::Switcher)
    }

    /// Untyped schema.
    #[must_use]
    pub fn null() -> Self {
        Self::new(SchemaKind::Null)
    }

    /// Named reference into the table.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Reference(name.into()))
    }

    /// Array schema with the given element schema.
    #[must_use]
    pub fn array(item: Schema) -> Self {
        Self::new(SchemaKind::Array(Box::new(item)))
    }

    /// Object schema with declared properties only.
    #[must_use]
    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        Self::new(SchemaKind::Object {
            properties: properties
                .into_iter()
                .map(|(key, schema)| (key.into(), schema))
                .collect(),
            additional: false,
        })
    }

    /// Object schema that also accepts undeclared keys.
    #[must_use]
    pub fn open_object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        let mut schema = Self::object(properties);
        if let SchemaKind::Object { additional, .. } = &mut schema.kind {
            *additional = true;
        }
        schema
    }
}

/// Mapping from schema name to schema definition.
pub type ReferenceTable = HashMap<String, Schema>;

/// Dereference a schema against the table.
///
/// Exactly one hop: if `schema` is a reference, the named target is
/// returned (which may itself be a reference; callers resolve again).
/// Concrete schemas are returned unchanged, so repeated resolution is
/// idempotent. Returns `None` when the name is absent from the table.
#[must_use]
pub fn resolve<'a>(schema: &'a Schema, table: &'a ReferenceTable) -> Option<&'a Schema> {
    match &schema.kind {
        SchemaKind::Reference(name) => table.get(name),
        _ => Some(schema),
    }
}

/// Follow a chain of references to a concrete schema.
///
/// Returns `None` when a name is absent from the table or the chain is a
/// reference-only cycle, which can never resolve.
#[must_use]
pub fn resolve_chain<'a>(schema: &'a Schema, table: &'a ReferenceTable) -> Option<&'a Schema> {
    let mut current = schema;
    let mut seen: Vec<&str> = Vec::new();
    while let SchemaKind::Reference(name) = &current.kind {
        if seen.contains(&name.as_str()) {
            return None;
        }
        seen.push(name);
        current = table.get(name)?;
    }
    Some(current)
}

/// Externally supplied schema binding for one field path.
///
/// The form-rendering layer supplies these for switcher fields and
/// open-ended additional properties, keyed by dot-separated paths like
/// `body.items.0.kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicField {
    /// A concrete schema for the field.
    Field(Schema),
    /// The field is explicitly untyped.
    Null,
}

/// Dynamic-field map keyed by dot-separated field path.
pub type DynamicFields = HashMap<String, DynamicField>;
