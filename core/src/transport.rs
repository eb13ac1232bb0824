//! In-process transport: hands requests straight to a handler instead of a
//! socket.
//!
//! # Design
//! `Transport` is the seam between dispatch and I/O. `InProcess` serves each
//! request by calling a `Handler` with a fresh `Recorder`, then freezes what
//! the handler wrote into an `http::Response<Bytes>`. Frozen bodies are
//! immutable and cheap to clone, so they can be read any number of times.
//!
//! Handlers that are tower services (an axum `Router`, for instance) go
//! through `ServiceHandler`, which drives the service on a private
//! current-thread runtime so the caller stays synchronous.

use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use tower::{Service, ServiceExt};

use crate::error::{BoxError, Error};

/// Turns a fully built request into a response.
pub trait Transport {
    fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error>;
}

/// The unit under test: reads a request and writes its answer to a `Recorder`.
pub trait Handler {
    fn serve(&self, req: Request<Bytes>, w: &mut Recorder);
}

impl<F> Handler for F
where
    F: Fn(Request<Bytes>, &mut Recorder),
{
    fn serve(&self, req: Request<Bytes>, w: &mut Recorder) {
        self(req, w)
    }
}

/// In-memory response sink. Status defaults to 200.
#[derive(Debug)]
pub struct Recorder {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Append `data` to the captured body.
    pub fn write_body(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    /// Freeze the captured status, headers, and body into a response.
    pub fn into_response(self) -> Response<Bytes> {
        let mut resp = Response::new(self.body.freeze());
        *resp.status_mut() = self.status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

impl io::Write for Recorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Transport that invokes a handler directly. Never fails: handler problems
/// show up as status codes, and handler panics unwind into the caller.
#[derive(Debug, Clone)]
pub struct InProcess<H> {
    handler: H,
}

impl<H> InProcess<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: Handler> Transport for InProcess<H> {
    fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        let mut w = Recorder::new();
        self.handler.serve(req, &mut w);
        Ok(w.into_response())
    }
}

/// Adapts a cloneable tower `Service` to `Handler`.
///
/// Each call runs `oneshot` on a clone of the service and collects the whole
/// response body before returning. A service or body error is recorded as a
/// 500 whose body is the error text.
///
/// The service is driven with `Runtime::block_on` on a private runtime, which
/// panics when called from within another tokio runtime. Call it from plain
/// threads and `#[test]` functions, never from async code or `#[tokio::test]`.
pub struct ServiceHandler<S> {
    service: S,
    runtime: tokio::runtime::Runtime,
}

impl<S> ServiceHandler<S> {
    pub fn new(service: S) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { service, runtime })
    }
}

impl<S> std::fmt::Debug for ServiceHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandler").finish_non_exhaustive()
    }
}

impl<S, B> Handler for ServiceHandler<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<B>> + Clone,
    S::Error: Into<BoxError>,
    B: http_body::Body,
    B::Error: Into<BoxError>,
{
    fn serve(&self, req: Request<Bytes>, w: &mut Recorder) {
        let service = self.service.clone();
        let req = req.map(Full::new);

        let result = self.runtime.block_on(async move {
            let resp = service.oneshot(req).await.map_err(Into::<BoxError>::into)?;
            let (parts, body) = resp.into_parts();
            let body = body.collect().await.map_err(Into::<BoxError>::into)?.to_bytes();
            Ok::<_, BoxError>((parts, body))
        });

        match result {
            Ok((parts, body)) => {
                w.set_status(parts.status);
                w.headers_mut().extend(parts.headers);
                w.write_body(&body);
            }
            Err(err) => {
                tracing::error!(%err, "service failed to produce a response");
                w.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                w.write_body(err.to_string());
            }
        }
    }
}
