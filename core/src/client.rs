//! Client facade: configuration, cookie state, and the verb methods.
//!
//! # Design
//! `ClientBuilder` collects settings on top of documented defaults and is
//! then finalized into a `Client` bound to a transport. Every verb funnels
//! into `Client::send`, which builds the request, attaches cookies and
//! credentials, writes the optional trace, runs the transport, reports to
//! the observer, and records any cookies the response set.
//!
//! The cookie jar is the only state that changes after construction, so the
//! verb methods take `&mut self`.

use std::fmt;
use std::io::{Read, Write};
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderValue, Method, Request};
use tracing::debug;

use crate::cookie::CookieJar;
use crate::debug::{render_request, render_response};
use crate::error::{BoxError, Error};
use crate::notifier::{NopNotifier, Notifier};
use crate::request::{build_request, resolve_url, Body, KeyValue, Multipart};
use crate::response::Response;
use crate::transport::{Handler, InProcess, ServiceHandler, Transport};

/// Base address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost";

type AuthFn = Box<dyn Fn(&mut Request<Bytes>) -> Result<(), BoxError> + Send>;

/// How outgoing requests are authenticated.
enum Auth {
    None,
    Basic {
        username: String,
        password: String,
    },
    Func(AuthFn),
}

impl Auth {
    fn apply(&self, req: &mut Request<Bytes>) -> Result<(), Error> {
        match self {
            Auth::None => Ok(()),
            Auth::Basic { username, password } => {
                let token = STANDARD.encode(format!("{username}:{password}"));
                let value = HeaderValue::from_str(&format!("Basic {token}"))
                    .map_err(http::Error::from)?;
                req.headers_mut().insert(AUTHORIZATION, value);
                Ok(())
            }
            Auth::Func(f) => f(req).map_err(Error::Auth),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Auth::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Settings for a `Client`.
///
/// | setting    | default            |
/// |------------|--------------------|
/// | `base_url` | `http://localhost` |
/// | auth       | none               |
/// | `output`   | none (no traces)   |
/// | `observer` | `NopNotifier`      |
pub struct ClientBuilder {
    base_url: String,
    auth: Auth,
    output: Option<Box<dyn Write + Send>>,
    notifier: Box<dyn Notifier + Send>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: Auth::None,
            output: None,
            notifier: Box::new(NopNotifier),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address relative paths are resolved against. Trailing slashes are
    /// stripped when the client is built.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send `Authorization: Basic ...` on every request.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Auth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Run `f` on every request before it is sent. An error aborts the call
    /// and the handler is never invoked.
    pub fn auth_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request<Bytes>) -> Result<(), BoxError> + Send + 'static,
    {
        self.auth = Auth::Func(Box::new(f));
        self
    }

    /// Write a plain-text trace of every request and response to `w`.
    pub fn output(mut self, w: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(w));
        self
    }

    pub fn observer(mut self, notifier: impl Notifier + Send + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Finish with an in-process transport calling `handler`.
    pub fn build<H: Handler>(self, handler: H) -> Client<InProcess<H>> {
        self.build_with_transport(InProcess::new(handler))
    }

    /// Finish with an in-process transport driving a tower service, such as
    /// an axum `Router`.
    ///
    /// The service runs on a private current-thread tokio runtime, so the
    /// returned client must not be used from inside another runtime (for
    /// example a `#[tokio::test]`): `Runtime::block_on` panics there.
    pub fn build_service<S>(self, service: S) -> Result<Client<InProcess<ServiceHandler<S>>>, Error>
    where
        ServiceHandler<S>: Handler,
    {
        let handler = ServiceHandler::new(service)?;
        Ok(self.build_with_transport(InProcess::new(handler)))
    }

    pub fn build_with_transport<T: Transport>(self, transport: T) -> Client<T> {
        Client {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            auth: self.auth,
            output: self.output,
            notifier: self.notifier,
            jar: CookieJar::new(),
            transport,
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("output", &self.output.is_some())
            .finish_non_exhaustive()
    }
}

/// Test client bound to one transport, normally a handler under test.
pub struct Client<T> {
    base_url: String,
    auth: Auth,
    output: Option<Box<dyn Write + Send>>,
    notifier: Box<dyn Notifier + Send>,
    jar: CookieJar,
    transport: T,
}

impl Client<()> {
    /// Start configuring a client. Same as `ClientBuilder::new()`.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<H: Handler> Client<InProcess<H>> {
    /// Client for `handler` with default settings.
    pub fn new(handler: H) -> Self {
        ClientBuilder::new().build(handler)
    }
}

impl<T: Transport> Client<T> {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Value of a cookie captured from an earlier response.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.jar.get(name)
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.jar
    }

    /// Full URL for `path` with `query` appended.
    pub fn url(&self, path: &str, query: &[KeyValue]) -> String {
        resolve_url(&self.base_url, path, query)
    }

    pub fn get(&mut self, path: &str, query: &[KeyValue]) -> Result<Response, Error> {
        self.send(Method::GET, path, HeaderMap::new(), Body::Empty, query)
    }

    pub fn post(&mut self, path: &str, body: impl Into<Body>) -> Result<Response, Error> {
        self.send(Method::POST, path, HeaderMap::new(), body, &[])
    }

    pub fn put(&mut self, path: &str, body: impl Into<Body>) -> Result<Response, Error> {
        self.send(Method::PUT, path, HeaderMap::new(), body, &[])
    }

    pub fn patch(&mut self, path: &str, body: impl Into<Body>) -> Result<Response, Error> {
        self.send(Method::PATCH, path, HeaderMap::new(), body, &[])
    }

    pub fn delete(&mut self, path: &str, query: &[KeyValue]) -> Result<Response, Error> {
        self.send(Method::DELETE, path, HeaderMap::new(), Body::Empty, query)
    }

    /// POST everything `r` yields as a single `image/png` multipart part
    /// named `image` with file name `sample.png`.
    pub fn upload(&mut self, path: &str, mut r: impl Read) -> Result<Response, Error> {
        let multipart = Multipart::image(&mut r)?;

        let mut headers = HeaderMap::new();
        let content_type =
            HeaderValue::from_str(&multipart.content_type()).map_err(http::Error::from)?;
        headers.insert(CONTENT_TYPE, content_type);

        self.send(Method::POST, path, headers, multipart.into_body(), &[])
    }

    /// GET straight through the transport: auth is applied, but the cookie
    /// jar, debug trace, and observer are all bypassed and the raw transport
    /// response is returned.
    pub fn transport_get(
        &self,
        path: &str,
        query: &[KeyValue],
    ) -> Result<http::Response<Bytes>, Error> {
        let url = self.url(path, query);
        let mut req = build_request(Method::GET, &url, &HeaderMap::new(), Body::Empty)?;
        self.auth.apply(&mut req)?;
        self.transport.round_trip(req)
    }

    /// Issue an arbitrary request. `headers` are added on top of the ones the
    /// client manages; the `Cookie` header is always replaced by the jar's
    /// contents when the jar is not empty.
    pub fn send(
        &mut self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: impl Into<Body>,
        query: &[KeyValue],
    ) -> Result<Response, Error> {
        let body = body.into();
        let url = self.url(path, query);
        let pretty = match self.output {
            Some(_) => body.pretty()?,
            None => None,
        };

        let mut req = build_request(method, &url, &headers, body)?;
        if let Some(cookies) = self.jar.header_value() {
            let value = HeaderValue::from_str(&cookies).map_err(http::Error::from)?;
            req.headers_mut().insert(COOKIE, value);
        }
        self.auth.apply(&mut req)?;

        if let Some(w) = self.output.as_mut() {
            w.write_all(render_request(&req, pretty.as_deref()).as_bytes())?;
        }

        let method = req.method().clone();
        let request_path = req.uri().path().to_string();

        let started = Instant::now();
        let resp = self.transport.round_trip(req)?;
        let elapsed = started.elapsed();

        self.notifier
            .notify(resp.status(), &method, &request_path, elapsed);
        debug!(%method, %url, status = resp.status().as_u16(), ?elapsed, "mock request");

        let resp = Response::from(resp);
        self.jar.store_all(resp.headers());

        if let Some(w) = self.output.as_mut() {
            w.write_all(render_response(&resp).as_bytes())?;
            w.flush()?;
        }

        Ok(resp)
    }
}

impl<T: fmt::Debug> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("jar", &self.jar)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use http::header::SET_COOKIE;
    use http::StatusCode;
    use http_body_util::Full;
    use serde_json::json;

    use super::*;
    use crate::transport::Recorder;

    /// Debug sink the test can read back.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Answers with the request line it saw.
    fn echo_request(req: Request<Bytes>, w: &mut Recorder) {
        w.write_body(format!("{} {}", req.method(), req.uri()));
    }

    /// Answers with the value of header `name`.
    fn echo_header(name: &'static str) -> impl Fn(Request<Bytes>, &mut Recorder) {
        move |req: Request<Bytes>, w: &mut Recorder| {
            if let Some(value) = req.headers().get(name) {
                w.write_body(value.as_bytes());
            }
        }
    }

    /// Accepts `writes` calls, then fails every later one.
    struct FailingSink {
        writes: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.writes == 0 {
                return Err(std::io::Error::other("sink closed"));
            }
            self.writes -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Sets a cookie on the first call and fails every call after it.
    #[derive(Default)]
    struct DropsAfterFirst {
        calls: AtomicUsize,
    }

    impl Transport for DropsAfterFirst {
        fn round_trip(&self, _req: Request<Bytes>) -> Result<http::Response<Bytes>, Error> {
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(Error::Transport("connection reset".into()));
            }
            Ok(http::Response::builder()
                .header(SET_COOKIE, "a=1")
                .body(Bytes::new())?)
        }
    }

    fn strip_whitespace(s: &str) -> String {
        s.split_whitespace().collect()
    }

    #[test]
    fn default_base_url_is_localhost() {
        let mut client = Client::new(echo_request);
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        let resp = client.get("/", &[]).unwrap();
        assert_eq!(resp.text(), "GET http://localhost/");
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let mut client = ClientBuilder::new()
            .base_url("http://api.test:8080///")
            .build(echo_request);
        assert_eq!(client.base_url(), "http://api.test:8080");

        let resp = client.get("/users", &[]).unwrap();
        assert_eq!(resp.text(), "GET http://api.test:8080/users");
    }

    #[test]
    fn absolute_paths_skip_base() {
        let mut client = Client::new(echo_request);
        let resp = client.delete("https://elsewhere.test/x", &[]).unwrap();
        assert_eq!(resp.text(), "DELETE https://elsewhere.test/x");
    }

    #[test]
    fn query_pairs_keep_order_and_duplicates() {
        let mut client = Client::new(echo_request);
        let query = [
            KeyValue::new("tag", "b"),
            KeyValue::new("tag", "a"),
            KeyValue::new("q", "x y"),
        ];
        let resp = client.get("/search", &query).unwrap();
        assert_eq!(resp.text(), "GET http://localhost/search?tag=b&tag=a&q=x+y");
    }

    #[test]
    fn verbs_use_their_methods() {
        let mut client = Client::new(echo_request);
        assert_eq!(client.post("/", Body::Empty).unwrap().text(), "POST http://localhost/");
        assert_eq!(client.put("/", Body::Empty).unwrap().text(), "PUT http://localhost/");
        assert_eq!(client.patch("/", Body::Empty).unwrap().text(), "PATCH http://localhost/");
        assert_eq!(client.delete("/", &[]).unwrap().text(), "DELETE http://localhost/");
    }

    #[test]
    fn send_adds_caller_headers() {
        let mut client = Client::new(echo_header("x-api-key"));
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));

        let resp = client
            .send(Method::OPTIONS, "/", headers, Body::Empty, &[])
            .unwrap();
        assert_eq!(resp.text(), "secret");
    }

    #[test]
    fn json_round_trip_leaves_body_alone() {
        let mut client = Client::new(|req: Request<Bytes>, w: &mut Recorder| {
            let input: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
            assert_eq!(input, json!({"hello": "world"}));
            w.write_body(r#"{"foo":"bar"}"#);
        });

        let body = Body::json(&json!({"hello": "world"})).unwrap();
        let resp = client.post("/", body).unwrap();
        let out: serde_json::Value = resp.json().unwrap();
        assert_eq!(out, json!({"foo": "bar"}));
    }

    #[test]
    fn raw_and_stream_bodies_are_sent_verbatim() {
        let mut client = Client::new(|req: Request<Bytes>, w: &mut Recorder| {
            w.write_body(req.body());
        });

        let resp = client.put("/", b"raw bytes".as_slice()).unwrap();
        assert_eq!(resp.text(), "raw bytes");

        let resp = client
            .patch("/", Body::reader(Cursor::new(b"from a stream".to_vec())))
            .unwrap();
        assert_eq!(resp.text(), "from a stream");
    }

    #[test]
    fn basic_auth_sets_authorization_header() {
        let mut client = ClientBuilder::new()
            .basic_auth("foo", "bar")
            .build(echo_header("authorization"));

        assert_eq!(client.get("/", &[]).unwrap().text(), "Basic Zm9vOmJhcg==");
        assert_eq!(client.post("/", Body::Empty).unwrap().text(), "Basic Zm9vOmJhcg==");
    }

    #[test]
    fn auth_fn_can_decorate_request() {
        let mut client = ClientBuilder::new()
            .auth_fn(|req| {
                req.headers_mut()
                    .insert(AUTHORIZATION, HeaderValue::from_static("Bearer t0k3n"));
                Ok(())
            })
            .build(echo_header("authorization"));

        assert_eq!(client.get("/", &[]).unwrap().text(), "Bearer t0k3n");
    }

    #[test]
    fn auth_failure_aborts_before_handler() {
        let calls = Arc::new(Mutex::new(0));
        let seen = calls.clone();
        let mut client = ClientBuilder::new()
            .auth_fn(|_req| Err("no credentials".into()))
            .build(move |_req: Request<Bytes>, _w: &mut Recorder| {
                *seen.lock().unwrap() += 1;
            });

        let err = client.get("/", &[]).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(err.to_string(), "authentication failed: no credentials");
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn malformed_url_is_reported() {
        let mut client = Client::new(echo_request);
        let err = client.get("/has space", &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn cookies_are_replayed_on_later_calls() {
        let mut client = Client::new(|req: Request<Bytes>, w: &mut Recorder| {
            match req.headers().get(COOKIE) {
                Some(cookie) => w.write_body(cookie.as_bytes()),
                None => {
                    w.headers_mut()
                        .append(SET_COOKIE, HeaderValue::from_static("woot=first; Path=/"));
                    w.headers_mut()
                        .append(SET_COOKIE, HeaderValue::from_static("other=2"));
                }
            }
        });

        let first = client.get("/", &[]).unwrap();
        assert_eq!(first.cookie("woot"), Some("first"));
        assert_eq!(client.cookie("woot"), Some("first"));
        assert_eq!(client.cookie("other"), Some("2"));
        assert!(client.cookie("missing").is_none());

        let second = client.get("/", &[]).unwrap();
        assert_eq!(second.text(), "woot=first; other=2");
    }

    #[test]
    fn jar_replaces_caller_cookie_header() {
        let mut client = Client::new(|req: Request<Bytes>, w: &mut Recorder| {
            if let Some(cookie) = req.headers().get(COOKIE) {
                w.write_body(cookie.as_bytes());
            }
            w.headers_mut()
                .insert(SET_COOKIE, HeaderValue::from_static("a=1"));
        });

        client.get("/", &[]).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("b=2"));
        let resp = client
            .send(Method::GET, "/", headers, Body::Empty, &[])
            .unwrap();
        assert_eq!(resp.text(), "a=1");
    }

    #[test]
    fn upload_sends_single_png_part() {
        let mut client = Client::new(|req: Request<Bytes>, w: &mut Recorder| {
            let content_type = req.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
            let boundary = content_type
                .strip_prefix("multipart/form-data; boundary=")
                .unwrap()
                .to_string();
            let body = String::from_utf8(req.body().to_vec()).unwrap();

            assert_eq!(*req.method(), Method::POST);
            assert_eq!(body.matches(&format!("--{boundary}\r\n")).count(), 1);
            assert!(body.contains("Content-Type: image/png\r\n\r\nPNGDATA\r\n"));
            assert!(body.ends_with(&format!("--{boundary}--\r\n")));
            w.set_status(StatusCode::CREATED);
        });

        let resp = client.upload("/avatar", Cursor::new(b"PNGDATA".to_vec())).unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[test]
    fn observer_sees_status_method_and_path() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        let mut client = ClientBuilder::new()
            .observer(
                move |status: StatusCode, method: &Method, path: &str, _elapsed: Duration| {
                    record
                        .lock()
                        .unwrap()
                        .push((status.as_u16(), method.to_string(), path.to_string()));
                },
            )
            .build(|_req: Request<Bytes>, w: &mut Recorder| w.set_status(StatusCode::NOT_FOUND));

        client.get("/missing", &[KeyValue::new("q", "1")]).unwrap();
        client.delete("/gone", &[]).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (404, "GET".to_string(), "/missing".to_string()),
                (404, "DELETE".to_string(), "/gone".to_string()),
            ]
        );
    }

    #[test]
    fn output_traces_request_and_response() {
        let sink = Capture::default();
        let mut client = ClientBuilder::new()
            .output(sink.clone())
            .basic_auth("foo", "bar")
            .build(|_req: Request<Bytes>, w: &mut Recorder| {
                w.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                w.write_body("{\"foo\":\"bar\"}\n");
            });

        let body = Body::json(&json!({"hello": "world"})).unwrap();
        let resp = client.post("/", body).unwrap();

        let content = strip_whitespace(&sink.text());
        assert!(content.contains("POSThttp://localhost/"), "{content}");
        assert!(content.contains("Authorization:BasicZm9vOmJhcg=="), "{content}");
        assert!(content.contains(&strip_whitespace("{\n  \"hello\": \"world\"\n}")));
        assert!(content.contains("#--Response"), "{content}");
        assert!(content.contains("200OK"), "{content}");
        assert!(content.contains("{\"foo\":\"bar\"}#--End"), "{content}");

        let out: serde_json::Value = resp.json().unwrap();
        assert_eq!(out, json!({"foo": "bar"}), "tracing must leave the body alone");
    }

    #[test]
    fn output_hides_binary_request_bodies() {
        let sink = Capture::default();
        let mut client = ClientBuilder::new()
            .output(sink.clone())
            .build(|_req: Request<Bytes>, _w: &mut Recorder| {});

        client.upload("/img", Cursor::new(vec![0x89, 0x50, 0x4e, 0x47])).unwrap();
        let trace = sink.text();
        assert!(trace.contains("[binary content]"));
        assert!(trace.contains("Content-Type: multipart/form-data; boundary="));
    }

    #[test]
    fn no_output_without_sink() {
        let mut client = Client::new(echo_request);
        let resp = client.get("/", &[]).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn builder_is_reachable_from_client() {
        let mut client = Client::builder()
            .base_url("http://api.test")
            .build(echo_request);
        assert_eq!(client.get("/", &[]).unwrap().text(), "GET http://api.test/");
    }

    #[test]
    fn build_service_drives_a_tower_service() {
        let service = tower::service_fn(|req: Request<Full<Bytes>>| async move {
            let line = format!("{} {}", req.method(), req.uri());
            Ok::<_, Infallible>(http::Response::new(Full::new(Bytes::from(line))))
        });
        let mut client = Client::builder().build_service(service).unwrap();

        let resp = client.post("/svc", Body::Empty).unwrap();
        assert_eq!(resp.text(), "POST http://localhost/svc");
    }

    #[test]
    fn cookies_are_stored_even_if_response_trace_fails() {
        let mut client = ClientBuilder::new()
            .output(FailingSink { writes: 1 })
            .build(|_req: Request<Bytes>, w: &mut Recorder| {
                w.headers_mut()
                    .insert(SET_COOKIE, HeaderValue::from_static("woot=kept"));
            });

        let err = client.get("/", &[]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(client.cookie("woot"), Some("kept"));
    }

    #[test]
    fn transport_failure_skips_observer_and_jar() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut client = ClientBuilder::new()
            .observer(move |_: StatusCode, _: &Method, _: &str, _: Duration| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build_with_transport(DropsAfterFirst::default());

        client.get("/", &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let err = client.get("/", &[]).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.to_string(), "transport error: connection reset");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.cookie("a"), Some("1"));
        assert_eq!(client.cookies().len(), 1);
    }

    #[test]
    fn transport_get_bypasses_jar_trace_and_observer() {
        let sink = Capture::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut client = ClientBuilder::new()
            .output(sink.clone())
            .basic_auth("foo", "bar")
            .observer(move |_: StatusCode, _: &Method, _: &str, _: Duration| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build(|req: Request<Bytes>, w: &mut Recorder| {
                let cookie = req.headers().get(COOKIE).map(|v| v.to_str().unwrap().to_string());
                let auth = req.headers()[AUTHORIZATION].to_str().unwrap().to_string();
                w.headers_mut()
                    .insert(SET_COOKIE, HeaderValue::from_static("woot=1"));
                w.write_body(format!("{} {} {:?} {auth}", req.method(), req.uri(), cookie));
            });

        client.get("/", &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let traced = sink.text().len();

        let raw = client
            .transport_get("/raw", &[KeyValue::new("q", "1")])
            .unwrap();
        assert_eq!(
            raw.body().as_ref(),
            b"GET http://localhost/raw?q=1 None Basic Zm9vOmJhcg=="
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.text().len(), traced);
    }
}
