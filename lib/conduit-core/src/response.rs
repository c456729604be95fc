//! Response model.
//!
//! A [`Response`] keeps the [`Request`] that produced it, so that stages
//! further up the pipeline can relate an outcome to its request (identity,
//! URL, options) without threading it separately.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::{Error, Request, Result};

/// Response with status, headers and a buffered body.
#[derive(Debug, Clone)]
pub struct Response {
    request: Request,
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Creates a new response to `request`.
    #[must_use]
    pub fn new(request: Request, status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            request,
            status,
            headers,
            body: body.into(),
        }
    }

    /// The request this response answers.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Canonical reason phrase of the status, if known.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Single header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 3xx.
    #[must_use]
    pub const fn is_redirection(&self) -> bool {
        self.status >= 300 && self.status < 400
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Turn a non-2xx response into [`Error::Http`].
    ///
    /// # Errors
    ///
    /// Returns an HTTP error carrying the status and body when the status is
    /// not 2xx.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self.reason().unwrap_or("unknown status");
        Err(Error::http_with_body(self.status, message, self.body))
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_json(&self.body)
    }

    /// Body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| Error::json_deserialization("", format!("body is not UTF-8: {e}")))
    }
}
