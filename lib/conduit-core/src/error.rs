//! Error types for conduit.
//!
//! Every stage passes errors upward unchanged unless its contract is to
//! absorb them (retry) or to produce them (validation, timeout). The error
//! type is [`Clone`] so that deduplicated callers all observe the same failure.

use derive_more::{Display, Error};

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Chain or request shape violation, never retried.
    #[display("configuration")]
    Configuration,
    /// Failure reported by the transport.
    #[display("transport")]
    Transport,
    /// Deadline elapsed before the execution completed.
    #[display("timeout")]
    Timeout,
    /// Payload encoding or decoding failure.
    #[display("codec")]
    Codec,
    /// Error raised by user code inside a stage.
    #[display("custom")]
    Custom,
}

// ============================================================================
// Configuration Error
// ============================================================================

/// A request declares a requirement that the composed chain cannot honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Error)]
pub enum ConfigurationError {
    /// The request has a timeout but the chain has no timeout stage.
    #[display("request sets a timeout but the pipeline has no timeout stage")]
    MissingTimeoutStage,
    /// The request has a retry policy but the chain has no retry stage.
    #[display("request sets a retry policy but the pipeline has no retry stage")]
    MissingRetryStage,
    /// The request has a server environment but the chain has no server environment stage.
    #[display(
        "request sets a server environment but the pipeline has no server environment stage"
    )]
    MissingServerEnvironmentStage,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for conduit operations.
#[derive(Debug, Clone, Display, Error)]
pub enum Error {
    /// The pipeline is not able to honor the request options.
    #[display("configuration error: {_0}")]
    Configuration(ConfigurationError),

    /// Invalid request shape, rejected before dispatch.
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),

    /// URL could not be assembled from the request parts.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),

    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// The execution was cancelled because its deadline elapsed.
    #[display("request timeout")]
    Timeout,

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    JsonSerialization(#[error(not(source))] String),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    FormSerialization(#[error(not(source))] String),

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    QuerySerialization(#[error(not(source))] String),

    /// Error raised by user code.
    #[display("{_0}")]
    Custom(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<ConfigurationError> for Error {
    fn from(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::JsonSerialization(error.to_string())
    }
}

impl From<serde_html_form::ser::Error> for Error {
    fn from(error: serde_html_form::ser::Error) -> Self {
        Self::QuerySerialization(error.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an error from user code.
    #[must_use]
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::InvalidRequest(_) | Self::InvalidUrl(_) => {
                ErrorKind::Configuration
            }
            Self::Http { .. } | Self::Connection(_) | Self::Tls(_) => ErrorKind::Transport,
            Self::Timeout => ErrorKind::Timeout,
            Self::JsonSerialization(_)
            | Self::JsonDeserialization { .. }
            | Self::FormSerialization(_)
            | Self::QuerySerialization(_) => ErrorKind::Codec,
            Self::Custom(_) => ErrorKind::Custom,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` for chain or request shape violations.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }

    /// Returns `true` for payload encoding or decoding failures.
    #[must_use]
    pub const fn is_codec(&self) -> bool {
        matches!(self.kind(), ErrorKind::Codec)
    }

    /// Returns `true` if retrying may change the outcome.
    ///
    /// Transport, timeout and custom errors are retryable.
    /// Configuration and codec errors are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Timeout | ErrorKind::Custom
        )
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn error_display() {
        let err = Error::http(404, "Not Found");
        check!(err.to_string() == "HTTP error 404: Not Found");

        let err = Error::Timeout;
        check!(err.to_string() == "request timeout");

        let err = Error::connection("failed to connect");
        check!(err.to_string() == "connection error: failed to connect");

        let err = Error::from(ConfigurationError::MissingTimeoutStage);
        check!(
            err.to_string()
                == "configuration error: request sets a timeout but the pipeline has no timeout stage"
        );
    }

    #[test]
    fn error_kind() {
        check!(Error::from(ConfigurationError::MissingRetryStage).kind() == ErrorKind::Configuration);
        check!(Error::invalid_request("body").kind() == ErrorKind::Configuration);
        check!(Error::connection("refused").kind() == ErrorKind::Transport);
        check!(Error::http(503, "Service Unavailable").kind() == ErrorKind::Transport);
        check!(Error::Timeout.kind() == ErrorKind::Timeout);
        check!(Error::json_deserialization("a", "b").kind() == ErrorKind::Codec);
        check!(Error::custom("boom").kind() == ErrorKind::Custom);
    }

    #[test]
    fn timeout_is_not_a_transport_error() {
        check!(Error::Timeout.is_timeout());
        check!(!Error::Timeout.is_connection());
        check!(!Error::connection("reset").is_timeout());
    }

    #[test]
    fn error_is_retryable() {
        check!(Error::connection("reset").is_retryable());
        check!(Error::Timeout.is_retryable());
        check!(!Error::from(ConfigurationError::MissingTimeoutStage).is_retryable());
        check!(!Error::json_deserialization("", "expected value").is_retryable());
    }

    #[test]
    fn error_status() {
        let err = Error::http(404, "Not Found");
        check!(err.status() == Some(404));
        check!(err.is_client_error());
        check!(!err.is_server_error());

        let err = Error::http(500, "Internal Server Error");
        check!(err.is_server_error());

        check!(Error::Timeout.status() == None);
    }

    #[test]
    fn error_body() {
        let body = bytes::Bytes::from(r#"{"error": "not found"}"#);
        let err = Error::http_with_body(404, "Not Found", body.clone());
        check!(err.body() == Some(&body));
        check!(Error::Timeout.body().is_none());
    }

    #[test]
    fn error_is_clone() {
        let err = Error::connection("reset");
        let cloned = err.clone();
        check!(err.to_string() == cloned.to_string());
    }
}
