//! Request body construction.
//!
//! Runs value conversion once over the root form value and wraps the
//! result into a [`Body`]: a JSON text payload or a multipart form
//! container. Multipart encoding is done by hand with a random boundary;
//! the container owns the matching `Content-Type` value.

use rand::RngExt;
use serde::{Deserialize, Serialize};

use dk_schema::{
    Conversion, DynamicFields, FieldValue, FileHandle, FileInJson, Normalized, ReferenceTable,
    Schema, convert,
};

use crate::error::BodyError;

/// Root field path for dynamic-field lookups under the request body.
const ROOT_PATH: &str = "body";

/// Body encoding mode declared by the operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    Json,
    FormData,
}

/// A built request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// JSON text payload.
    Json(String),
    /// Multipart form container.
    Multipart(MultipartForm),
}

/// Result of body building: the encoded body plus conversion diagnostics.
#[derive(Clone, Debug)]
pub struct BuiltBody {
    pub body: Body,
    /// Non-fatal diagnostics collected during value conversion.
    pub warnings: Vec<String>,
}

/// One entry of a multipart form.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Multipart form container with manual boundary framing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartForm {
    fn new() -> Self {
        Self {
            boundary: format!("----DkFormBoundary{:016x}", rand::rng().random::<u64>()),
            parts: Vec::new(),
        }
    }

    fn add_text(&mut self, name: &str, value: String) {
        self.parts.push(Part {
            name: name.to_owned(),
            filename: None,
            content_type: None,
            data: value.into_bytes(),
        });
    }

    fn add_file(&mut self, name: &str, file: FileHandle) {
        self.parts.push(Part {
            name: name.to_owned(),
            filename: Some(file.filename),
            content_type: file.content_type,
            data: file.data,
        });
    }

    /// `Content-Type` header value carrying the boundary.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Number of entries in the form.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True when the form has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Encode the form into wire bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        let boundary = &self.boundary;
        let mut body = Vec::new();

        for part in &self.parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match &part.filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name)
                        .as_bytes(),
                ),
            }
            if let Some(content_type) = &part.content_type {
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(&part.data);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }
}

/// Build a request body from a raw form value.
///
/// Conversion runs once over the whole value against the root schema.
/// JSON mode serializes the normalized result; form-data mode requires an
/// object root and attaches files directly, all-file arrays as repeated
/// entries under the same key, and everything else as JSON-serialized
/// text entries. Absent keys are omitted entirely.
pub fn build_body(
    encoding: Encoding,
    raw: &FieldValue,
    schema: &Schema,
    table: &ReferenceTable,
    dynamic: &DynamicFields,
) -> Result<BuiltBody, BodyError> {
    let Conversion { value, warnings } = convert(ROOT_PATH, raw, schema, table, dynamic)?;

    let body = match encoding {
        Encoding::Json => {
            let json = value.into_json()?.unwrap_or(serde_json::Value::Null);
            Body::Json(serde_json::to_string(&json)?)
        }
        Encoding::FormData => {
            let Normalized::Object(entries) = value else {
                return Err(BodyError::FormDataRoot {
                    actual: value.type_name(),
                });
            };

            let mut form = MultipartForm::new();
            for (key, value) in entries {
                match value {
                    Normalized::Absent => {}
                    Normalized::File(file) => form.add_file(&key, file),
                    Normalized::Array(items)
                        if items
                            .iter()
                            .all(|item| matches!(item, Normalized::File(_))) =>
                    {
                        for item in items {
                            if let Normalized::File(file) = item {
                                form.add_file(&key, file);
                            }
                        }
                    }
                    other => {
                        let json = other.into_json().map_err(|FileInJson { filename }| {
                            BodyError::UnexpectedFile { key: key.clone(), filename }
                        })?;
                        if let Some(json) = json {
                            form.add_text(&key, serde_json::to_string(&json)?);
                        }
                    }
                }
            }
            Body::Multipart(form)
        }
    };

    Ok(BuiltBody { body, warnings })
}
