//! Request methods.

use derive_more::Display;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum Method {
    /// Retrieve a resource.
    #[default]
    #[display("GET")]
    Get,
    /// Create a resource.
    #[display("POST")]
    Post,
    /// Replace a resource.
    #[display("PUT")]
    Put,
    /// Remove a resource.
    #[display("DELETE")]
    Delete,
    /// Partially update a resource.
    #[display("PATCH")]
    Patch,
    /// Retrieve headers only.
    #[display("HEAD")]
    Head,
    /// Retrieve allowed methods.
    #[display("OPTIONS")]
    Options,
    /// Establish a tunnel.
    #[display("CONNECT")]
    Connect,
    /// Loop-back test.
    #[display("TRACE")]
    Trace,
}

impl Method {
    /// Returns `true` if the method is safe (does not modify resources).
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
    }

    /// Returns `true` if the method is idempotent.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::Head | Self::Options | Self::Trace | Self::Put | Self::Delete
        )
    }

    /// Returns `true` if a request with this method must not carry a body.
    #[must_use]
    pub const fn forbids_body(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
            Method::Connect => Self::CONNECT,
            Method::Trace => Self::TRACE,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::DELETE => Ok(Self::Delete),
            http::Method::PATCH => Ok(Self::Patch),
            http::Method::HEAD => Ok(Self::Head),
            http::Method::OPTIONS => Ok(Self::Options),
            http::Method::CONNECT => Ok(Self::Connect),
            http::Method::TRACE => Ok(Self::Trace),
            other => Err(crate::Error::invalid_request(format!(
                "unsupported method: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::Connect.to_string(), "CONNECT");
        assert_eq!(Method::Trace.to_string(), "TRACE");
    }

    #[test]
    fn method_default_is_get() {
        assert_eq!(Method::default(), Method::Get);
    }

    #[test]
    fn method_forbids_body() {
        assert!(Method::Get.forbids_body());
        assert!(Method::Head.forbids_body());
        assert!(!Method::Post.forbids_body());
        assert!(!Method::Delete.forbids_body());
        assert!(!Method::Options.forbids_body());
    }

    #[test]
    fn method_is_idempotent() {
        assert!(Method::Put.is_idempotent());
        assert!(Method::Trace.is_idempotent());
        assert!(!Method::Post.is_idempotent());
        assert!(!Method::Connect.is_idempotent());
    }

    #[test]
    fn method_http_conversions() {
        for method in [Method::Get, Method::Connect, Method::Trace, Method::Patch] {
            let converted = http::Method::from(method);
            assert_eq!(Method::try_from(converted).expect("known method"), method);
        }

        let custom = http::Method::from_bytes(b"PURGE").expect("valid token");
        assert!(Method::try_from(custom).is_err());
    }
}
