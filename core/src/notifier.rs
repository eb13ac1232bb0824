//! Per-call observer hook.

use std::time::Duration;

use http::{Method, StatusCode};

/// Told about every completed call: status, method, URL path (no query), and
/// how long the transport took.
pub trait Notifier {
    fn notify(&self, status: StatusCode, method: &Method, path: &str, elapsed: Duration);
}

impl<F> Notifier for F
where
    F: Fn(StatusCode, &Method, &str, Duration),
{
    fn notify(&self, status: StatusCode, method: &Method, path: &str, elapsed: Duration) {
        self(status, method, path, elapsed)
    }
}

/// Ignores every call. The default observer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopNotifier;

impl Notifier for NopNotifier {
    fn notify(&self, _status: StatusCode, _method: &Method, _path: &str, _elapsed: Duration) {}
}
