//! Mock HTTP client for exercising request handlers without sockets.
//!
//! # Overview
//! A `Client` is bound to a handler (a closure over `Recorder`, or any tower
//! service such as an axum `Router`) and issues GET/POST/PUT/PATCH/DELETE and
//! upload calls straight into it. Each call returns a `Response` with the
//! status, headers, a re-readable body, and the cookies it set.
//!
//! # Design
//! - Dispatch goes through the `Transport` trait; `InProcess` is the
//!   socket-free implementation, and anything else (a real HTTP agent) can
//!   be plugged in with `ClientBuilder::build_with_transport`.
//! - The client remembers cookies between calls and replays them in one
//!   `Cookie` header.
//! - An optional debug sink receives a plain-text trace of each exchange, and
//!   an optional `Notifier` is told the status, method, path, and timing.
//!
//! ```
//! use bytes::Bytes;
//! use http::Request;
//! use mockhttp::{Client, KeyValue, Recorder};
//!
//! let mut client = Client::new(|req: Request<Bytes>, w: &mut Recorder| {
//!     w.write_body(req.uri().query().unwrap_or_default());
//! });
//! let resp = client.get("/echo", &[KeyValue::new("q", "hi")]).unwrap();
//! assert_eq!(resp.code(), 200);
//! assert_eq!(resp.text(), "q=hi");
//! ```

pub mod client;
pub mod cookie;
mod debug;
pub mod error;
pub mod notifier;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use crate::cookie::CookieJar;
pub use error::{BoxError, Error};
pub use notifier::{NopNotifier, Notifier};
pub use request::{Body, KeyValue};
pub use response::Response;
pub use transport::{Handler, InProcess, Recorder, ServiceHandler, Transport};
