//! Raw form values and normalized conversion output.
//!
//! [`FieldValue`] is the shape the form-rendering collaborator collects
//! user input into; [`Normalized`] is what conversion produces, shaped to
//! match the declared schema. The normalized side carries an explicit
//! [`Normalized::Absent`] marker so optional empty fields can be omitted
//! from the final body instead of serializing as empty values.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Opaque binary payload collected from a file input.
///
/// Treated as an uninterpreted handle throughout conversion; only the
/// multipart encoder looks inside.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Original filename, used for the multipart `filename` parameter.
    pub filename: String,
    /// MIME type, when the collaborator knows it.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

impl FileHandle {
    /// Create a handle from a filename and raw bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data,
        }
    }

    /// Attach a MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Raw user input for one field, as collected by the form layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Absent input.
    Null,
    /// Text input. Form controls deliver scalars as text.
    Text(String),
    /// File input.
    File(FileHandle),
    /// Repeated field group.
    List(Vec<FieldValue>),
    /// Nested field group.
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Text value from anything string-like.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// True for absent input and the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

/// Returned when a file handle reaches a JSON serialization context.
#[derive(Debug, thiserror::Error)]
#[error("file `{filename}` cannot be embedded in a JSON value")]
pub struct FileInJson {
    /// Filename of the offending handle.
    pub filename: String,
}

/// Conversion output, shaped to match the declared schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    /// Omitted from the final body entirely.
    Absent,
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// Passed through untouched; consumed by the multipart encoder.
    File(FileHandle),
    Array(Vec<Normalized>),
    Object(BTreeMap<String, Normalized>),
}

impl Normalized {
    /// Runtime type name for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::File(_) => "file",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Project into a JSON value.
    ///
    /// `Absent` at the top level becomes `None`. Absent object entries are
    /// dropped; absent array elements become JSON `null` so positions are
    /// preserved. File handles cannot be represented and return
    /// [`FileInJson`].
    pub fn into_json(self) -> Result<Option<Value>, FileInJson> {
        Ok(Some(match self {
            Self::Absent => return Ok(None),
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(value),
            Self::Number(value) => Value::Number(value),
            Self::String(value) => Value::String(value),
            Self::File(file) => {
                return Err(FileInJson {
                    filename: file.filename,
                });
            }
            Self::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| Ok(item.into_json()?.unwrap_or(Value::Null)))
                    .collect::<Result<_, FileInJson>>()?,
            ),
            Self::Object(entries) => {
                let mut map = serde_json::Map::with_capacity(entries.len());
                for (key, value) in entries {
                    if let Some(value) = value.into_json()? {
                        map.insert(key, value);
                    }
                }
                Value::Object(map)
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::text("").is_empty());
        assert!(!FieldValue::text("x").is_empty());
        assert!(!FieldValue::List(Vec::new()).is_empty());
    }

    #[test]
    fn test_into_json_drops_absent_object_entries() {
        let value = Normalized::Object(BTreeMap::from([
            ("a".to_owned(), Normalized::String("x".to_owned())),
            ("b".to_owned(), Normalized::Absent),
        ]));

        let json = value.into_json().unwrap().unwrap();

        assert_eq!(json, serde_json::json!({"a": "x"}));
    }

    #[test]
    fn test_into_json_absent_array_element_becomes_null() {
        let value = Normalized::Array(vec![Normalized::Bool(true), Normalized::Absent]);

        let json = value.into_json().unwrap().unwrap();

        assert_eq!(json, serde_json::json!([true, null]));
    }

    #[test]
    fn test_into_json_top_level_absent_is_none() {
        assert_eq!(Normalized::Absent.into_json().unwrap(), None);
    }

    #[test]
    fn test_into_json_rejects_file_handles() {
        let value = Normalized::File(FileHandle::new("avatar.png", vec![1, 2, 3]));

        let err = value.into_json().unwrap_err();

        assert_eq!(err.filename, "avatar.png");
    }

    #[test]
    fn test_file_handle_debug_hides_bytes() {
        let handle = FileHandle::new("a.bin", vec![0; 1024]);

        let rendered = format!("{handle:?}");

        assert!(rendered.contains("len: 1024"));
        assert!(!rendered.contains("[0,"));
    }
}
