//! Error types for the mock client.
//!
//! # Design
//! Request construction, authentication, and body decoding each get their own
//! variant so a test can tell "my fixture was malformed" apart from "the
//! handler answered with something I could not decode." The in-process
//! transport never fails on its own; `Transport` exists for transports that
//! do real I/O.

/// Boxed error used at the seams where callers plug in their own code
/// (authentication hooks, transports, tower services).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `Client` and `Response`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The method, URL, or a header could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    /// The authentication hook rejected the request; the handler was not called.
    #[error("authentication failed: {0}")]
    Auth(#[source] BoxError),

    /// A structured request body could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Reading a stream body or writing to the debug sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport could not produce a response.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The response body is not valid JSON for the requested type.
    #[error("json decode failed: {0}")]
    Json(#[source] serde_json::Error),

    /// The response body is not valid XML for the requested type.
    #[error("xml decode failed: {0}")]
    Xml(#[from] quick_xml::DeError),
}
