//! Built-in stages.
//!
//! Each stage wraps another one and reports the marker of its concern in
//! [`Stage::shape`](conduit_core::Stage::shape). They are usually built through
//! [`PipelineExt`](crate::PipelineExt) and [`HttpPipelineExt`](crate::HttpPipelineExt).

mod dedup;
mod delay;
mod environment;
mod identify;
mod logging;
mod retry;
mod throttle;
mod timeout;
mod validate;

pub use self::dedup::Deduplicate;
pub use self::delay::Delay;
pub use self::environment::ApplyServerEnvironment;
pub use self::identify::{IdGenerator, Identify, uuid_request_id};
pub use self::logging::{LogLevel, Loggable, Logged};
pub use self::retry::{PolicyResolver, Retry};
pub use self::throttle::Throttle;
pub use self::timeout::{DeadlineResolver, Timeout};
pub use self::validate::Validate;
