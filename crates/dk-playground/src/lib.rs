//! API playground request core for DocKit.
//!
//! Converts a user-filled form value into an HTTP request body according
//! to a declared schema, then executes the request and normalizes the
//! outcome.
//!
//! # Architecture
//!
//! - [`build_body`] runs `dk-schema` value conversion over the root form
//!   value and wraps the result as a JSON payload or a multipart form
//! - [`Fetcher`] issues the request with a fixed timeout and classifies
//!   the response (`json` / `html` / `text`); transport failures become a
//!   degraded [`FetchResult`] instead of an error
//!
//! # Example
//!
//! ```ignore
//! use dk_playground::{Encoding, FetchOptions, Fetcher, FetcherConfig, Method};
//! use dk_schema::{FieldValue, ReferenceTable, Schema};
//!
//! let fetcher = Fetcher::new(&FetcherConfig::default());
//! let mut options = FetchOptions::new("https://api.example.com/pets", Method::Post, Encoding::Json);
//! options.body = Some(FieldValue::text("rex"));
//! let result = fetcher.fetch(&options, Some(&Schema::string()), &ReferenceTable::new())?;
//! println!("{}", result.status);
//! ```

mod body;
mod error;
mod fetch;

pub use body::{Body, BuiltBody, Encoding, MultipartForm, build_body};
pub use error::BodyError;
pub use fetch::{FetchOptions, FetchResult, Fetcher, FetcherConfig, Method, Payload};
