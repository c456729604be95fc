//! Server environments.
//!
//! A [`ServerEnvironment`] is a profile of defaults (host, port, path prefix,
//! headers and query items) applied to a request before dispatch. Values
//! already present on the request win.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::Request;

/// Host, path prefix, headers and query items shared by the requests sent to
/// one server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerEnvironment {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path_prefix: Option<String>,
    headers: HeaderMap,
    query: Vec<(String, String)>,
}

impl ServerEnvironment {
    /// Empty environment, applying it changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheme used when the request has no host yet.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Default host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Default port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Prefix prepended to every request path.
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Header added to requests that do not already carry it.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Query item appended after the request's own items.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Configured host.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Configured path prefix.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    /// Rewrite `request` with this environment.
    ///
    /// Scheme, host, port and path prefix only apply to a request without a
    /// host: a request addressed to its own host keeps its URL. Headers fill
    /// gaps and query items are appended in both cases.
    pub fn apply(&self, request: &mut Request) {
        if request.host().is_none() {
            if let Some(scheme) = &self.scheme {
                request.set_scheme(scheme.clone());
            }
            if let Some(host) = &self.host {
                request.set_host(host.clone());
            }
            if request.port().is_none()
                && let Some(port) = self.port
            {
                request.set_port(port);
            }
            if let Some(prefix) = &self.path_prefix {
                let path = join_path(prefix, request.path());
                request.set_path(path);
            }
        }

        for (name, value) in &self.headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().append(name.clone(), value.clone());
            }
        }

        for (name, value) in &self.query {
            request.push_query(name.clone(), value.clone());
        }
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let segments = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    let mut joined = format!("/{}", segments.join("/"));
    if path.ends_with('/') && joined.len() > 1 {
        joined.push('/');
    }
    joined
}
