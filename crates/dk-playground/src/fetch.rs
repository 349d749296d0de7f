//! Single-shot request execution with normalized results.
//!
//! [`Fetcher`] owns a configured agent with a fixed global timeout. Each
//! [`Fetcher::fetch`] call builds its own header list and body, so
//! concurrent "try it" invocations do not interfere. Transport failures
//! (network errors, timeouts, decode errors) never escape: they are
//! absorbed into a degraded [`FetchResult`] with status 400. Structural
//! body errors do propagate: a malformed schema wins over a best-effort
//! guess.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use dk_schema::{DynamicFields, FieldValue, ReferenceTable, Schema};

use crate::body::{Body, BuiltBody, Encoding, build_body};
use crate::error::BodyError;

/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 6000;

/// HTTP method of a playground request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    /// True when requests with this method carry a body.
    #[must_use]
    pub fn carries_body(self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

/// One "try it" invocation: constructed per user action, consumed once.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Body encoding mode.
    pub encoding: Encoding,
    /// Header mapping. Entries with empty values are dropped at request
    /// time.
    pub headers: Vec<(String, String)>,
    /// Raw form value for the request body.
    pub body: Option<FieldValue>,
    /// Dynamic-field map for late-bound schemas.
    pub dynamic_fields: DynamicFields,
}

impl FetchOptions {
    /// Options with no headers, body or dynamic fields.
    #[must_use]
    pub fn new(url: impl Into<String>, method: Method, encoding: Encoding) -> Self {
        Self {
            url: url.into(),
            method,
            encoding,
            headers: Vec::new(),
            body: None,
            dynamic_fields: DynamicFields::new(),
        }
    }
}

/// Decoded response payload, classified by content type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Payload {
    /// `application/json` response, decoded as structured data.
    Json(serde_json::Value),
    /// `text/html` response, decoded as text.
    Html(String),
    /// Anything else, decoded as text.
    Text(String),
}

/// Normalized outcome of one fetch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FetchResult {
    /// HTTP status, or 400 for synthesized transport failures.
    pub status: u16,
    #[serde(flatten)]
    pub payload: Payload,
}

impl FetchResult {
    /// Normalize a transport failure.
    ///
    /// Status 400 here is a local convention, not an HTTP-standard code;
    /// the payload combines the error's name and message.
    #[must_use]
    pub fn failure(error: &ureq::Error) -> Self {
        let name = match error {
            ureq::Error::Timeout(..) => "TimeoutError",
            ureq::Error::Io(..) => "NetworkError",
            _ => "FetchError",
        };
        Self {
            status: 400,
            payload: Payload::Text(format!("{name}: {error}")),
        }
    }
}

/// Fetcher configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Client-side timeout in milliseconds. Exceeding it aborts the
    /// in-flight request.
    pub timeout_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Executes playground requests.
pub struct Fetcher {
    agent: Agent,
}

impl Fetcher {
    /// Create a fetcher with the given configuration.
    #[must_use]
    pub fn new(config: &FetcherConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    /// Build the body, issue the request and normalize the outcome.
    ///
    /// `body_schema` is the root schema the raw body value converts
    /// against; it is ignored when the options carry no body or the
    /// method cannot send one.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError`] for schema/contract violations during body
    /// construction. Transport failures are absorbed into the returned
    /// [`FetchResult`], never an `Err`.
    pub fn fetch(
        &self,
        options: &FetchOptions,
        body_schema: Option<&Schema>,
        table: &ReferenceTable,
    ) -> Result<FetchResult, BodyError> {
        let built = match (&options.body, body_schema) {
            (Some(raw), Some(schema)) if options.method.carries_body() => Some(build_body(
                options.encoding,
                raw,
                schema,
                table,
                &options.dynamic_fields,
            )?),
            _ => None,
        };

        let mut multipart_content_type = None;
        let mut bytes = None;
        if let Some(BuiltBody { body, warnings }) = built {
            if !warnings.is_empty() {
                tracing::debug!(
                    url = %options.url,
                    count = warnings.len(),
                    "Body conversion produced diagnostics"
                );
            }
            bytes = Some(match body {
                Body::Json(text) => text.into_bytes(),
                Body::Multipart(form) => {
                    multipart_content_type = Some(form.content_type());
                    form.into_bytes()
                }
            });
        }

        let headers = request_headers(options, multipart_content_type);

        tracing::debug!(url = %options.url, method = ?options.method, "Sending playground request");

        Ok(match self.execute(options, &headers, bytes) {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(url = %options.url, error = %error, "Request failed");
                FetchResult::failure(&error)
            }
        })
    }

    fn execute(
        &self,
        options: &FetchOptions,
        headers: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> Result<FetchResult, ureq::Error> {
        // Applies headers without naming the builder's typestate, which
        // differs between body-carrying and body-less requests.
        macro_rules! with_headers {
            ($builder:expr) => {{
                let mut builder = $builder;
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder
            }};
        }

        let url = options.url.as_str();
        let bytes = body.unwrap_or_default();

        let response = match options.method {
            Method::Get => with_headers!(self.agent.get(url)).call()?,
            Method::Head => with_headers!(self.agent.head(url)).call()?,
            Method::Post => with_headers!(self.agent.post(url)).send(&bytes[..])?,
            Method::Put => with_headers!(self.agent.put(url)).send(&bytes[..])?,
            Method::Patch => with_headers!(self.agent.patch(url)).send(&bytes[..])?,
            Method::Delete if bytes.is_empty() => {
                with_headers!(self.agent.delete(url)).call()?
            }
            Method::Delete => {
                with_headers!(self.agent.delete(url).force_send_body()).send(&bytes[..])?
            }
        };

        normalize(response)
    }
}

/// Assemble request headers.
///
/// Unless the body is form-data, `Content-Type: application/json` is
/// forced ahead of caller headers. Caller values that are empty strings
/// are dropped. In form-data mode caller `Content-Type` entries are
/// dropped too: the multipart container owns that header so the boundary
/// parameter always matches the encoded body.
fn request_headers(
    options: &FetchOptions,
    multipart_content_type: Option<String>,
) -> Vec<(String, String)> {
    let mut headers = Vec::new();

    if options.encoding != Encoding::FormData {
        headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
    }

    for (name, value) in &options.headers {
        if value.is_empty() {
            continue;
        }
        if options.encoding == Encoding::FormData && name.eq_ignore_ascii_case("content-type") {
            continue;
        }
        headers.push((name.clone(), value.clone()));
    }

    if let Some(content_type) = multipart_content_type {
        headers.push(("Content-Type".to_owned(), content_type));
    }

    headers
}

/// Classify and decode a response.
fn normalize(response: ureq::http::Response<ureq::Body>) -> Result<FetchResult, ureq::Error> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_owned();

    let mut body = response.into_body();
    let payload = if content_type.starts_with("application/json") {
        Payload::Json(body.read_json::<serde_json::Value>()?)
    } else {
        let text = body.read_to_string()?;
        if content_type.starts_with("text/html") {
            Payload::Html(text)
        } else {
            Payload::Text(text)
        }
    };

    Ok(FetchResult { status, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_forces_content_type() {
        let options = FetchOptions::new("http://example.test", Method::Post, Encoding::Json);

        let headers = request_headers(&options, None);

        assert_eq!(
            headers,
            vec![("Content-Type".to_owned(), "application/json".to_owned())]
        );
    }

    #[test]
    fn test_empty_header_values_are_dropped() {
        let mut options = FetchOptions::new("http://example.test", Method::Get, Encoding::Json);
        options.headers = vec![
            ("Authorization".to_owned(), "Bearer t".to_owned()),
            ("X-Empty".to_owned(), String::new()),
        ];

        let headers = request_headers(&options, None);

        assert!(headers.iter().any(|(name, _)| name == "Authorization"));
        assert!(!headers.iter().any(|(name, _)| name == "X-Empty"));
    }

    #[test]
    fn test_form_data_mode_keeps_boundary_authoritative() {
        let mut options =
            FetchOptions::new("http://example.test", Method::Post, Encoding::FormData);
        options.headers = vec![("Content-Type".to_owned(), "text/plain".to_owned())];

        let headers = request_headers(
            &options,
            Some("multipart/form-data; boundary=x".to_owned()),
        );

        assert_eq!(
            headers,
            vec![(
                "Content-Type".to_owned(),
                "multipart/form-data; boundary=x".to_owned()
            )]
        );
    }

    #[test]
    fn test_method_body_rules() {
        assert!(!Method::Get.carries_body());
        assert!(!Method::Head.carries_body());
        assert!(Method::Post.carries_body());
        assert!(Method::Delete.carries_body());
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = FetchResult {
            status: 200,
            payload: Payload::Html("<p>hi</p>".to_owned()),
        };

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"status": 200, "type": "html", "data": "<p>hi</p>"})
        );
    }

    #[test]
    fn test_json_payload_serialization() {
        let result = FetchResult {
            status: 201,
            payload: Payload::Json(serde_json::json!({"ok": true})),
        };

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"status": 201, "type": "json", "data": {"ok": true}})
        );
    }

    #[test]
    fn test_html_response_is_classified_as_html() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      Content-Type: text/html; charset=utf-8\r\n\
                      Content-Length: 9\r\n\
                      Connection: close\r\n\
                      \r\n\
                      <p>hi</p>",
                )
                .unwrap();
        });

        let fetcher = Fetcher::new(&FetcherConfig::default());
        let options = FetchOptions::new(format!("http://{address}/"), Method::Get, Encoding::Json);

        let result = fetcher
            .fetch(&options, None, &ReferenceTable::new())
            .unwrap();

        server.join().unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.payload, Payload::Html("<p>hi</p>".to_owned()));
    }

    #[test]
    fn test_timeout_normalizes_to_degraded_result() {
        use std::net::TcpListener;
        use std::time::Duration;

        // Accept the connection but never respond; the client-side
        // timeout must abort the request.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_secs(2));
            drop(stream);
        });

        let fetcher = Fetcher::new(&FetcherConfig { timeout_ms: 200 });
        let options = FetchOptions::new(format!("http://{address}/"), Method::Get, Encoding::Json);

        let result = fetcher
            .fetch(&options, None, &ReferenceTable::new())
            .unwrap();

        assert_eq!(result.status, 400);
        let Payload::Text(message) = &result.payload else {
            panic!("expected text payload");
        };
        assert!(message.to_lowercase().contains("time"));
    }

    #[test]
    fn test_transport_failure_normalizes_to_degraded_result() {
        // Nothing listens on port 9; the refused connection must come
        // back as a result, not an error.
        let fetcher = Fetcher::new(&FetcherConfig { timeout_ms: 1000 });
        let options = FetchOptions::new("http://127.0.0.1:9/", Method::Get, Encoding::Json);

        let result = fetcher
            .fetch(&options, None, &ReferenceTable::new())
            .unwrap();

        assert_eq!(result.status, 400);
        assert!(matches!(result.payload, Payload::Text(_)));
    }

    #[test]
    fn test_structural_body_errors_propagate() {
        let fetcher = Fetcher::new(&FetcherConfig::default());
        let mut options =
            FetchOptions::new("http://127.0.0.1:9/", Method::Post, Encoding::FormData);
        options.body = Some(FieldValue::text("scalar"));
        let schema = Schema::string();

        let err = fetcher
            .fetch(&options, Some(&schema), &ReferenceTable::new())
            .unwrap_err();

        assert!(matches!(err, BodyError::FormDataRoot { .. }));
    }
}
