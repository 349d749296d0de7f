//! Error types for request building.

use dk_schema::{ConvertError, FileInJson};

/// Error from body construction.
///
/// These are caller/schema contract violations; they abort body
/// construction and propagate. Transport failures never surface here;
/// the fetcher absorbs them into a normalized result
/// (see [`crate::FetchResult::failure`]).
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// Value conversion hit a contract violation.
    #[error("value conversion failed")]
    Convert(#[from] ConvertError),

    /// Form-data encoding requires an object root value.
    #[error("form-data body must be an object, got {actual}")]
    FormDataRoot {
        /// Runtime type of the offending root value.
        actual: &'static str,
    },

    /// A file handle appeared in a JSON payload.
    #[error("JSON body cannot carry files")]
    FileInJson(#[from] FileInJson),

    /// A file handle was nested inside a non-file form entry.
    #[error("form entry `{key}` nests file `{filename}` inside a text value")]
    UnexpectedFile {
        /// Form entry key.
        key: String,
        /// Filename of the nested handle.
        filename: String,
    },

    /// JSON serialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}
