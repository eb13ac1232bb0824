//! Minimal cookie jar.
//!
//! `Set-Cookie` headers are parsed with the `cookie` crate, but the jar keys
//! cookies by name only; path and domain are ignored. A cookie whose
//! `Max-Age` is zero or less, or whose `Expires` date has passed, removes the
//! entry. Every `Set-Cookie` header on a response is applied in order, so the
//! last value for a name wins.

use ::cookie::time::{Duration, OffsetDateTime};
use ::cookie::Cookie;
use http::header::SET_COOKIE;
use http::HeaderMap;

/// A parsed `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// The server asked the client to drop the cookie.
    pub expired: bool,
}

impl SetCookie {
    /// Parse a `Set-Cookie` header value. Returns `None` when there is no
    /// `name=value` pair or the name is empty.
    pub fn parse(header: &str) -> Option<Self> {
        let cookie = Cookie::parse(header).ok()?;
        Some(Self {
            name: cookie.name().to_string(),
            value: cookie.value_trimmed().to_string(),
            expired: is_expired(&cookie),
        })
    }
}

/// `Max-Age` wins over `Expires` when both are present.
fn is_expired(cookie: &Cookie<'_>) -> bool {
    match cookie.max_age() {
        Some(age) => age <= Duration::ZERO,
        None => cookie
            .expires_datetime()
            .is_some_and(|at| at <= OffsetDateTime::now_utc()),
    }
}

/// Parse every `Set-Cookie` header in `headers`, skipping malformed ones.
pub fn set_cookies(headers: &HeaderMap) -> Vec<SetCookie> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| {
            let parsed = value.to_str().ok().and_then(SetCookie::parse);
            if parsed.is_none() {
                tracing::warn!(?value, "ignoring malformed set-cookie header");
            }
            parsed
        })
        .collect()
}

/// Name to value cookie store, kept in first-set order.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Insert or overwrite `name`.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    /// Apply one `Set-Cookie` header.
    pub fn store(&mut self, cookie: &SetCookie) {
        if cookie.expired {
            self.remove(&cookie.name);
        } else {
            self.set(&cookie.name, &cookie.value);
        }
    }

    /// Apply every `Set-Cookie` header of a response.
    pub fn store_all(&mut self, headers: &HeaderMap) {
        for cookie in set_cookies(headers) {
            self.store(&cookie);
        }
    }

    /// The jar as a single `Cookie` header value, or `None` when empty.
    pub fn header_value(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}
