//! Plain-text request/response traces for the optional debug sink.

use std::fmt::Write;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, Request};

use crate::response::Response;

const REQUEST_BANNER: &str = "#-- Request ------------------------------------------";
const RESPONSE_BANNER: &str = "#-- Response -----------------------------------------";
const END_BANNER: &str = "#-- End ----------------------------------------------";

/// Render the outgoing request. `body` is the already prettified body, if any.
pub(crate) fn render_request(req: &Request<Bytes>, body: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{REQUEST_BANNER}");
    let _ = writeln!(out, "{} {}", req.method(), req.uri());
    write_headers(&mut out, req.headers());
    if let Some(body) = body {
        out.push('\n');
        out.push_str(body);
    }
    out
}

/// Render the response and close the block.
pub(crate) fn render_response(resp: &Response) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n\n{RESPONSE_BANNER}");
    let _ = writeln!(out, "{}", resp.status());
    write_headers(&mut out, resp.headers());
    out.push_str(&String::from_utf8_lossy(resp.body()));
    let _ = writeln!(out, "\n\n{END_BANNER}");
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let _ = writeln!(
            out,
            "{}: {}",
            canonical(name),
            String::from_utf8_lossy(value.as_bytes())
        );
    }
}

/// `content-type` -> `Content-Type`.
fn canonical(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
