//! Schema-driven conversion of raw form values.
//!
//! [`convert`] walks a raw [`FieldValue`] and its declared [`Schema`] in
//! parallel and produces a [`Normalized`] value ready for body encoding.
//! The walk is a pure recursive transform: no shared state between calls,
//! recursion bounded by the input value's depth even when the reference
//! table describes cyclic schemas.
//!
//! Rules, in priority order:
//! 1. Empty input (absent or `""`): required fields get a type-appropriate
//!    default (`false` for booleans, `""` otherwise); optional fields
//!    convert to [`Normalized::Absent`] and are omitted downstream.
//! 2. Arrays convert elementwise, extending the field path with the
//!    element index (`items.0`, `items.1`, …).
//! 3. Switcher fields look up their concrete schema in the dynamic-field
//!    map by full path, falling back to the untyped schema.
//! 4. Objects convert declared properties by schema; undeclared keys go
//!    through the dynamic-field map when additional properties are
//!    allowed, otherwise pass through unconverted with a diagnostic.
//! 5. Primitives coerce: numbers parse from text, booleans accept only the
//!    literal `"true"` (and treat `"null"` as absent), files pass through
//!    untouched, everything else becomes text.
//!
//! Diagnostics are non-fatal: they are collected on the returned
//! [`Conversion`] and logged, never thrown. Only contract violations
//! (a declared reference missing from the table) abort conversion.

use std::collections::BTreeMap;

use crate::schema::{DynamicField, DynamicFields, ReferenceTable, Schema, SchemaKind};
use crate::value::{FieldValue, Normalized};

/// Conversion output with collected non-fatal diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    /// The normalized value.
    pub value: Normalized,
    /// Diagnostics for fields that could not be fully resolved.
    pub warnings: Vec<String>,
}

/// Contract violation detected during conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A declared schema reference is missing from the reference table.
    #[error("unknown schema reference `{name}` at `{path}`")]
    UnknownReference { path: String, name: String },

    /// A declared reference chain loops without reaching a concrete schema.
    #[error("cyclic schema reference `{name}` at `{path}`")]
    CyclicReference { path: String, name: String },
}

/// Convert a raw value against its declared schema.
///
/// `path` is the dot-separated field path of `raw` (the request body root
/// is conventionally `body`); dynamic-field lookups key on paths derived
/// from it.
pub fn convert(
    path: &str,
    raw: &FieldValue,
    schema: &Schema,
    table: &ReferenceTable,
    dynamic: &DynamicFields,
) -> Result<Conversion, ConvertError> {
    let mut warnings = Vec::new();
    let value = convert_value(path, raw, schema, table, dynamic, &mut warnings)?;
    Ok(Conversion { value, warnings })
}

fn convert_value(
    path: &str,
    raw: &FieldValue,
    schema: &Schema,
    table: &ReferenceTable,
    dynamic: &DynamicFields,
    warnings: &mut Vec<String>,
) -> Result<Normalized, ConvertError> {
    let schema = resolve_declared(path, schema, table)?;

    if raw.is_empty() {
        if !schema.required {
            return Ok(Normalized::Absent);
        }
        return Ok(match schema.kind {
            SchemaKind::Boolean => Normalized::Bool(false),
            _ => Normalized::String(String::new()),
        });
    }

    match (&schema.kind, raw) {
        (SchemaKind::Array(item), FieldValue::List(elements)) => {
            let mut converted = Vec::with_capacity(elements.len());
            for (index, element) in elements.iter().enumerate() {
                let element_path = format!("{path}.{index}");
                converted.push(convert_value(
                    &element_path,
                    element,
                    item,
                    table,
                    dynamic,
                    warnings,
                )?);
            }
            Ok(Normalized::Array(converted))
        }
        (SchemaKind::Switcher, _) => {
            let target = dynamic_schema(path, table, dynamic);
            convert_value(path, raw, &target, table, dynamic, warnings)
        }
        (
            SchemaKind::Object {
                properties,
                additional,
            },
            FieldValue::Map(entries),
        ) => {
            let mut converted = BTreeMap::new();
            for (key, value) in entries {
                let child_path = format!("{path}.{key}");
                let child = if let Some(property) = properties.get(key) {
                    convert_value(&child_path, value, property, table, dynamic, warnings)?
                } else if *additional {
                    let target = dynamic_schema(&child_path, table, dynamic);
                    convert_value(&child_path, value, &target, table, dynamic, warnings)?
                } else {
                    diagnostic(warnings, &child_path, "unknown key passed through unconverted");
                    passthrough(value)
                };
                if !matches!(child, Normalized::Absent) {
                    converted.insert(key.clone(), child);
                }
            }
            // Declared required properties the form never sent still get
            // their empty-input default.
            for (key, property) in properties {
                if property.required && !entries.contains_key(key) {
                    let child_path = format!("{path}.{key}");
                    let child = convert_value(
                        &child_path,
                        &FieldValue::Null,
                        property,
                        table,
                        dynamic,
                        warnings,
                    )?;
                    converted.insert(key.clone(), child);
                }
            }
            Ok(Normalized::Object(converted))
        }
        (kind, raw) => Ok(coerce(path, kind, raw, warnings)),
    }
}

/// Look up the concrete schema for a late-bound field.
///
/// Missing entries, explicit null entries, unresolvable references and
/// entries that are themselves switchers all fall back to the untyped
/// schema, so the value passes through largely unconverted.
fn dynamic_schema(path: &str, table: &ReferenceTable, dynamic: &DynamicFields) -> Schema {
    let resolved = match dynamic.get(path) {
        Some(DynamicField::Field(schema)) => crate::schema::resolve_chain(schema, table).cloned(),
        _ => None,
    };
    resolved
        .filter(|schema| !matches!(schema.kind, SchemaKind::Switcher))
        .unwrap_or_else(Schema::null)
}

/// Resolve a declared schema through its reference chain.
///
/// A missing or cyclic declared reference is a caller/schema contract
/// violation and aborts conversion.
fn resolve_declared<'a>(
    path: &str,
    schema: &'a Schema,
    table: &'a ReferenceTable,
) -> Result<&'a Schema, ConvertError> {
    let mut current = schema;
    let mut seen: Vec<&str> = Vec::new();
    while let SchemaKind::Reference(name) = &current.kind {
        if seen.contains(&name.as_str()) {
            return Err(ConvertError::CyclicReference {
                path: path.to_owned(),
                name: name.clone(),
            });
        }
        seen.push(name);
        current = table.get(name).ok_or_else(|| ConvertError::UnknownReference {
            path: path.to_owned(),
            name: name.clone(),
        })?;
    }
    Ok(current)
}

/// Coerce a non-empty value to a primitive schema kind.
fn coerce(path: &str, kind: &SchemaKind, raw: &FieldValue, warnings: &mut Vec<String>) -> Normalized {
    match kind {
        SchemaKind::Number => match raw {
            FieldValue::Text(text) => match parse_number(text) {
                Some(number) => Normalized::Number(number),
                None => {
                    diagnostic(warnings, path, "value is not numeric");
                    Normalized::Null
                }
            },
            other => {
                diagnostic(warnings, path, "expected numeric text");
                passthrough(other)
            }
        },
        SchemaKind::Boolean => match raw {
            FieldValue::Text(text) if text == "true" => Normalized::Bool(true),
            FieldValue::Text(text) if text == "null" => Normalized::Absent,
            _ => Normalized::Bool(false),
        },
        // Opaque handle; only the multipart encoder looks inside.
        SchemaKind::File | SchemaKind::Null => passthrough(raw),
        _ => match raw {
            FieldValue::Text(text) => Normalized::String(text.clone()),
            FieldValue::File(_) => passthrough(raw),
            other => {
                diagnostic(warnings, path, "expected text");
                passthrough(other)
            }
        },
    }
}

fn parse_number(text: &str) -> Option<serde_json::Number> {
    let text = text.trim();
    if let Ok(int) = text.parse::<i64>() {
        return Some(serde_json::Number::from(int));
    }
    text.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
}

/// Forward a value structurally without coercion.
fn passthrough(raw: &FieldValue) -> Normalized {
    match raw {
        FieldValue::Null => Normalized::Null,
        FieldValue::Text(text) => Normalized::String(text.clone()),
        FieldValue::File(file) => Normalized::File(file.clone()),
        FieldValue::List(items) => Normalized::Array(items.iter().map(passthrough).collect()),
        FieldValue::Map(entries) => Normalized::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), passthrough(value)))
                .collect(),
        ),
    }
}

fn diagnostic(warnings: &mut Vec<String>, path: &str, detail: &str) {
    tracing::warn!(path = %path, "{detail}");
    warnings.push(format!("{path}: {detail}"));
}
