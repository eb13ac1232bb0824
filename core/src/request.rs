//! Request assembly: URL resolution, query strings, bodies, and the upload
//! envelope.
//!
//! # Design
//! A request body is one of three payload shapes (raw bytes, a stream, or a
//! JSON value) or nothing at all. `Body` spells those out as variants so the
//! dispatch code never has to guess what it was handed. Streams are drained
//! exactly once, when the request is built.

use std::fmt;
use std::io::Read;

use bytes::{BufMut, Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, Request};
use serde::Serialize;

use crate::error::Error;

/// Form field name used by `Client::upload`.
pub const UPLOAD_FIELD: &str = "image";

/// File name used by `Client::upload`.
pub const UPLOAD_FILENAME: &str = "sample.png";

/// Content type of the single part sent by `Client::upload`.
pub const UPLOAD_CONTENT_TYPE: &str = "image/png";

/// Placeholder shown in debug traces instead of raw or streamed bodies.
pub(crate) const BINARY_PLACEHOLDER: &str = "[binary content]";

/// One query parameter. Repeated keys are all kept, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for KeyValue {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Payload of an outgoing request.
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Bytes sent verbatim.
    Bytes(Bytes),
    /// A stream, read to the end once when the request is built.
    Reader(Box<dyn Read + Send>),
    /// A structured value, sent as JSON.
    Json(serde_json::Value),
}

impl Body {
    /// Encode `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(Error::Serialize)
    }

    pub fn reader(r: impl Read + Send + 'static) -> Self {
        Body::Reader(Box::new(r))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Human-readable rendering for debug traces. Only JSON bodies are shown;
    /// anything else is replaced by a placeholder.
    pub(crate) fn pretty(&self) -> Result<Option<String>, Error> {
        match self {
            Body::Empty => Ok(None),
            Body::Bytes(_) | Body::Reader(_) => Ok(Some(BINARY_PLACEHOLDER.to_string())),
            Body::Json(value) => serde_json::to_string_pretty(value)
                .map(Some)
                .map_err(Error::Serialize),
        }
    }

    pub(crate) fn into_bytes(self) -> Result<Bytes, Error> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Bytes(bytes) => Ok(bytes),
            Body::Reader(mut r) => {
                let mut buf = Vec::new();
                r.read_to_end(&mut buf)?;
                Ok(buf.into())
            }
            Body::Json(value) => serde_json::to_vec(&value)
                .map(Bytes::from)
                .map_err(Error::Serialize),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Body::Reader(_) => f.write_str("Reader(..)"),
            Body::Json(value) => f.debug_tuple("Json").field(value).finish(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes.into())
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Body::Bytes(Bytes::from_static(bytes))
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<Option<Body>> for Body {
    fn from(body: Option<Body>) -> Self {
        body.unwrap_or_default()
    }
}

/// True when `path` already names a full URL.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Resolve `path` against `base` and append the encoded query pairs.
///
/// `base` is expected to have no trailing slash.
pub fn resolve_url(base: &str, path: &str, query: &[KeyValue]) -> String {
    let mut url = if is_absolute(path) {
        path.to_string()
    } else {
        format!("{base}{path}")
    };

    if !query.is_empty() {
        let mut encoder = form_urlencoded::Serializer::new(String::new());
        for kv in query {
            encoder.append_pair(&kv.key, &kv.value);
        }
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encoder.finish());
    }

    url
}

/// Build the request for `method` and `url`. Caller headers are appended in
/// order; JSON bodies get a JSON content type unless one was supplied.
pub fn build_request(
    method: Method,
    url: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<Request<Bytes>, Error> {
    let is_json = matches!(body, Body::Json(_));
    let payload = body.into_bytes()?;

    let mut builder = Request::builder().method(method).uri(url);
    if let Some(h) = builder.headers_mut() {
        for (name, value) in headers {
            h.append(name.clone(), value.clone());
        }
        if is_json && !h.contains_key(CONTENT_TYPE) {
            h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
    }

    Ok(builder.body(payload)?)
}

/// A single-part `multipart/form-data` body carrying an image upload.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    body: Bytes,
}

impl Multipart {
    /// Wrap everything `r` yields as the `image` part.
    pub fn image(r: &mut dyn Read) -> Result<Self, Error> {
        let boundary = uuid::Uuid::new_v4().simple().to_string();

        let mut data = Vec::new();
        r.read_to_end(&mut data)?;

        let mut body = BytesMut::with_capacity(data.len() + 256);
        body.put_slice(format!("--{boundary}\r\n").as_bytes());
        body.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{UPLOAD_FIELD}\"; filename=\"{UPLOAD_FILENAME}\"\r\n"
            )
            .as_bytes(),
        );
        body.put_slice(format!("Content-Type: {UPLOAD_CONTENT_TYPE}\r\n\r\n").as_bytes());
        body.put_slice(&data);
        body.put_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Ok(Self {
            boundary,
            body: body.freeze(),
        })
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `content-type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}
