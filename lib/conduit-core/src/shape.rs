//! Chain-shape descriptor.
//!
//! Each stage reports the markers of the stages it is built from. Wrapping
//! stages add their own marker to the shape of the stage they wrap, and
//! [`Pipe`](crate::Pipe) unions both sides, so the shape of a fully composed
//! pipeline is known at assembly time and can be checked structurally.

use bitflags::bitflags;

bitflags! {
    /// Set of stage markers present in a composed chain.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Shape: u16 {
        /// Request identity is applied.
        const IDENTITY = 1;
        /// Concurrent equal inputs are coalesced.
        const DEDUPLICATE = 1 << 1;
        /// Concurrent executions are bounded.
        const THROTTLE = 1 << 2;
        /// Failures are retried with a backoff policy.
        const RETRY = 1 << 3;
        /// Executions race a deadline.
        const TIMEOUT = 1 << 4;
        /// Executions are delayed.
        const DELAY = 1 << 5;
        /// Server environment profiles are applied.
        const SERVER_ENVIRONMENT = 1 << 6;
        /// Requests are validated before dispatch.
        const VALIDATE = 1 << 7;
        /// Executions are logged.
        const LOGGING = 1 << 8;
        /// The timeout option of each request is enforced.
        const REQUEST_TIMEOUT = 1 << 9;
        /// The retry policy option of each request is applied.
        const REQUEST_RETRY = 1 << 10;
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn default_shape_is_empty() {
        check!(Shape::default().is_empty());
    }

    #[test]
    fn shapes_union() {
        let shape = Shape::RETRY | Shape::TIMEOUT;
        check!(shape.contains(Shape::RETRY));
        check!(shape.contains(Shape::TIMEOUT));
        check!(!shape.contains(Shape::THROTTLE));
    }
}
