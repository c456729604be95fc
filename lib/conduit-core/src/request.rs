//! Request model.
//!
//! A [`Request`] keeps its URL as separate parts (scheme, host, port, path,
//! query) so that stages such as the server environment can fill or rewrite
//! them before the URL is assembled by the transport.
//!
//! # Example
//!
//! ```
//! use conduit_core::{Method, Request};
//!
//! let request = Request::builder(Method::Get)
//!     .url("https://api.example.com/users")
//!     .query("page", "1")
//!     .header("Accept", "application/json")
//!     .build()
//!     .expect("valid request");
//!
//! assert_eq!(
//!     request.url().expect("has host").as_str(),
//!     "https://api.example.com/users?page=1"
//! );
//! assert_eq!(request.header("accept"), Some("application/json"));
//! ```

use std::hash::{Hash, Hasher};
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Version};

use crate::{Body, Error, Method, Options, Result, ServerEnvironment, SharedRetryPolicy};

/// Default scheme when none is given.
pub const DEFAULT_SCHEME: &str = "https";

/// An outbound request with URL parts, headers, body and per-request options.
///
/// Equality and hashing cover the wire fields only: two requests that differ
/// only by their options are equal.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Body,
    version: Version,
    options: Options,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}

impl Request {
    /// Request without host, resolved later by a server environment.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            scheme: DEFAULT_SCHEME.to_owned(),
            host: None,
            port: None,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Body::empty(),
            version: Version::HTTP_11,
            options: Options::new(),
        }
    }

    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method) -> RequestBuilder {
        RequestBuilder::new(method)
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Change the request method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// URL scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Change the URL scheme.
    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        self.scheme = scheme.into();
    }

    /// Host, if known.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Change the host.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    /// Explicit port, if any.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Change the port.
    pub fn set_port(&mut self, port: u16) {
        self.port = Some(port);
    }

    /// URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Change the URL path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Query items, in order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Append a query item.
    pub fn push_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Single header value by case-insensitive name.
    ///
    /// Returns `None` for values that are not visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Set the body, and its content type unless one is already present.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        let body = body.into();
        if let Some(content_type) = body.content_type()
            && !self.headers.contains_key(CONTENT_TYPE)
        {
            self.headers.insert(CONTENT_TYPE, content_type.clone());
        }
        self.body = body;
    }

    /// Protocol version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Change the protocol version.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Per-request options.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable access to the per-request options.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Assemble the URL from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the request has no host yet, or if the
    /// parts do not form a valid URL.
    pub fn url(&self) -> Result<url::Url> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| Error::InvalidUrl(format!("no host for path '{}'", self.path)))?;

        let mut url = url::Url::parse(&format!("{}://{host}", self.scheme))?;
        if self.port.is_some() {
            url.set_port(self.port)
                .map_err(|()| Error::InvalidUrl(format!("cannot set port on '{url}'")))?;
        }
        url.set_path(&self.path);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }

    /// Convert into an `http::Request`, leaving the options behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be assembled.
    pub fn to_http(&self) -> Result<http::Request<Bytes>> {
        let uri = self.url()?.as_str().to_owned();
        let mut builder = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(uri)
            .version(self.version);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers.clone());
        }
        builder
            .body(self.body.as_bytes().clone())
            .map_err(|e| Error::invalid_request(e.to_string()))
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.scheme == other.scheme
            && self.host == other.host
            && self.port == other.port
            && self.path == other.path
            && self.query == other.query
            && self.headers == other.headers
            && self.body == other.body
            && self.version == other.version
    }
}

impl Eq for Request {}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.scheme.hash(state);
        self.host.hash(state);
        self.port.hash(state);
        self.path.hash(state);
        self.query.hash(state);

        // HeaderMap equality ignores insertion order across names
        let mut headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_bytes()))
            .collect::<Vec<_>>();
        headers.sort_unstable();
        headers.hash(state);

        self.body.hash(state);
        self.version.hash(state);
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing [`Request`] instances.
///
/// Invalid input is remembered and reported by [`RequestBuilder::build`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
    error: Option<Error>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            request: Request::new(method, "/"),
            error: None,
        }
    }

    fn fail(mut self, error: Error) -> Self {
        self.error.get_or_insert(error);
        self
    }

    /// Take scheme, host, port, path and query from an absolute URL.
    #[must_use]
    pub fn url(mut self, url: &str) -> Self {
        let url = match url::Url::parse(url) {
            Ok(url) => url,
            Err(e) => return self.fail(e.into()),
        };
        let Some(host) = url.host_str() else {
            return self.fail(Error::InvalidUrl(format!("no host in '{url}'")));
        };

        self.request.scheme = url.scheme().to_owned();
        self.request.host = Some(host.to_owned());
        self.request.port = url.port();
        self.request.path = url.path().to_owned();
        self.request
            .query
            .extend(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())));
        self
    }

    /// Sets the scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.request.set_scheme(scheme);
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.request.set_host(host);
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.request.set_port(port);
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.set_path(path);
        self
    }

    /// Appends a query item.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.push_query(name, value);
        self
    }

    /// Appends query items serialized from a value.
    #[must_use]
    pub fn query_from<T: serde::Serialize>(mut self, value: &T) -> Self {
        match crate::to_query_string(value) {
            Ok(query) => {
                self.request.query.extend(
                    url::form_urlencoded::parse(query.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned())),
                );
                self
            }
            Err(e) => self.fail(e),
        }
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        let name = match name.try_into() {
            Ok(name) => name,
            Err(e) => return self.fail(Error::invalid_request(e.into().to_string())),
        };
        let value = match value.try_into() {
            Ok(value) => value,
            Err(e) => return self.fail(Error::invalid_request(e.into().to_string())),
        };
        self.request.set_header(name, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.request.set_body(body);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json<T: serde::Serialize>(self, value: &T) -> Self {
        match Body::json(value) {
            Ok(body) => self.body(body),
            Err(e) => self.fail(e),
        }
    }

    /// Sets a form URL-encoded body.
    #[must_use]
    pub fn form<T: serde::Serialize>(self, value: &T) -> Self {
        match Body::form(value) {
            Ok(body) => self.body(body),
            Err(e) => self.fail(e),
        }
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.request.set_version(version);
        self
    }

    /// Sets the request identity.
    #[must_use]
    pub fn id(mut self, id: impl Into<crate::RequestId>) -> Self {
        self.request.set_id(id);
        self
    }

    /// Requests a deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.set_timeout(timeout);
        self
    }

    /// Requests a retry policy.
    #[must_use]
    pub fn retry_policy(mut self, policy: SharedRetryPolicy) -> Self {
        self.request.set_retry_policy(policy);
        self
    }

    /// Requests a server environment.
    #[must_use]
    pub fn server_environment(mut self, environment: ServerEnvironment) -> Self {
        self.request.set_server_environment(environment);
        self
    }

    /// Sets a user-defined option.
    #[must_use]
    pub fn option<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.request.set_option(value);
        self
    }

    /// Builds the [`Request`].
    ///
    /// # Errors
    ///
    /// Returns the first error met while building.
    pub fn build(self) -> Result<Request> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.request),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use assert2::{check, let_assert};

    use super::*;

    fn hash_of(request: &Request) -> u64 {
        let mut hasher = DefaultHasher::new();
        request.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn builder_from_url() {
        let request = Request::builder(Method::Get)
            .url("http://localhost:8080/users?active=true")
            .build()
            .expect("valid");

        check!(request.scheme() == "http");
        check!(request.host() == Some("localhost"));
        check!(request.port() == Some(8080));
        check!(request.path() == "/users");
        check!(request.query() == [("active".to_owned(), "true".to_owned())]);
        check!(
            request.url().expect("url").as_str() == "http://localhost:8080/users?active=true"
        );
    }

    #[test]
    fn url_without_host_fails() {
        let request = Request::new(Method::Get, "endpoint");
        let_assert!(Err(Error::InvalidUrl(_)) = request.url());
    }

    #[test]
    fn url_without_query_has_no_question_mark() {
        let request = Request::builder(Method::Get)
            .host("api.example.com")
            .path("items")
            .build()
            .expect("valid");
        check!(request.url().expect("url").as_str() == "https://api.example.com/items");
    }

    #[test]
    fn builder_defers_header_errors() {
        let result = Request::builder(Method::Get)
            .header("bad header", "value")
            .url("https://api.example.com")
            .build();
        let_assert!(Err(Error::InvalidRequest(_)) = result);
    }

    #[test]
    fn builder_defers_url_errors() {
        let result = Request::builder(Method::Get).url("not a url").build();
        let_assert!(Err(Error::InvalidUrl(_)) = result);
    }

    #[test]
    fn headers_are_case_insensitive_and_last_write_wins() {
        let mut request = Request::builder(Method::Get)
            .header("X-Api-Key", "one")
            .build()
            .expect("valid");
        request.set_header(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static("two"),
        );

        check!(request.header("X-API-KEY") == Some("two"));
        check!(request.headers().len() == 1);
    }

    #[test]
    fn body_sets_content_type_only_when_absent() {
        let request = Request::builder(Method::Post)
            .body("hello")
            .build()
            .expect("valid");
        check!(request.header("content-type") == Some("text/plain; charset=utf-8"));

        let request = Request::builder(Method::Post)
            .header("Content-Type", "application/vnd.custom")
            .json(&serde_json::json!({ "a": 1 }))
            .build()
            .expect("valid");
        check!(request.header("content-type") == Some("application/vnd.custom"));
        check!(request.body().as_bytes().as_ref() == br#"{"a":1}"#);
    }

    #[test]
    fn query_from_serializable() {
        #[derive(serde::Serialize)]
        struct Page {
            page: u32,
            size: u32,
        }

        let request = Request::builder(Method::Get)
            .query("q", "rust")
            .query_from(&Page { page: 2, size: 10 })
            .build()
            .expect("valid");
        check!(request.query().len() == 3);
        check!(request.query()[1] == ("page".to_owned(), "2".to_owned()));
    }

    #[test]
    fn options_do_not_affect_equality() {
        let base = Request::builder(Method::Get)
            .url("https://api.example.com/a")
            .header("b", "2")
            .header("a", "1");
        let left = base.clone().id("one").build().expect("valid");
        let right = base.timeout(Duration::from_secs(1)).build().expect("valid");

        check!(left == right);
        check!(hash_of(&left) == hash_of(&right));
    }

    #[test]
    fn header_order_does_not_affect_equality() {
        let left = Request::builder(Method::Get)
            .header("a", "1")
            .header("b", "2")
            .build()
            .expect("valid");
        let right = Request::builder(Method::Get)
            .header("b", "2")
            .header("a", "1")
            .build()
            .expect("valid");

        check!(left == right);
        check!(hash_of(&left) == hash_of(&right));
    }

    #[test]
    fn wire_fields_affect_equality() {
        let left = Request::new(Method::Get, "/a");
        check!(left != Request::new(Method::Post, "/a"));
        check!(left != Request::new(Method::Get, "/b"));
    }

    #[test]
    fn to_http_leaves_options_behind() {
        let request = Request::builder(Method::Put)
            .url("https://api.example.com/items/1")
            .header("x-trace", "abc")
            .body("payload")
            .id("req-9")
            .build()
            .expect("valid");

        let http_request = request.to_http().expect("http");
        check!(http_request.method() == http::Method::PUT);
        check!(http_request.uri() == "https://api.example.com/items/1");
        check!(http_request.headers().len() == 2);
        check!(http_request.extensions().is_empty());
        check!(http_request.body().as_ref() == b"payload");
    }
}
