//! The response handed back by every `Client` call.
//!
//! # Design
//! The body is held as `Bytes`, so `reader()` can hand out a fresh reader on
//! every call and nothing the client does internally (debug traces, cookie
//! parsing) uses it up before the caller gets to it.

use std::collections::HashMap;
use std::io::Read;

use bytes::{Buf, Bytes};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::cookie::set_cookies;
use crate::error::Error;

/// Status, headers, buffered body, and the cookies set by one call.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    cookies: HashMap<String, String>,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Numeric status code.
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// A new reader over the whole body. Can be called repeatedly.
    pub fn reader(&self) -> impl Read {
        self.body.clone().reader()
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Error::Json)
    }

    pub fn xml<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(quick_xml::de::from_reader(self.body.as_ref())?)
    }

    /// Cookies set by this response (removals excluded).
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

impl From<http::Response<Bytes>> for Response {
    fn from(resp: http::Response<Bytes>) -> Self {
        let (parts, body) = resp.into_parts();
        let cookies = set_cookies(&parts.headers)
            .into_iter()
            .filter(|c| !c.expired)
            .map(|c| (c.name, c.value))
            .collect();

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
            cookies,
        }
    }
}
