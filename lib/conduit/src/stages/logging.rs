//! Call logging.
//!
//! Each call runs inside a `pipeline_call` span carrying a summary of its
//! input. Outcomes are logged with the elapsed time in milliseconds.

use std::time::Instant;

use conduit_core::{Request, Response, Result, Shape, Stage};
use tracing::{Instrument, debug, info, info_span, warn};

/// Log level for the logging stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level.
    Debug,
    /// Log at info level.
    #[default]
    Info,
}

/// Values the logging stage knows how to summarize.
pub trait Loggable {
    /// One-line summary used in log events.
    fn log_summary(&self) -> String;

    /// HTTP status carried by the value, if any.
    ///
    /// A status of 400 or above is logged as a failure.
    fn log_status(&self) -> Option<u16> {
        None
    }
}

impl<T: Loggable + ?Sized> Loggable for &T {
    fn log_summary(&self) -> String {
        (**self).log_summary()
    }

    fn log_status(&self) -> Option<u16> {
        (**self).log_status()
    }
}

impl Loggable for Request {
    fn log_summary(&self) -> String {
        let target = self
            .url()
            .map_or_else(|_| self.path().to_owned(), String::from);
        format!("{} {target}", self.method())
    }
}

impl Loggable for Response {
    fn log_summary(&self) -> String {
        match self.reason() {
            Some(reason) => format!("{} {reason}", self.status()),
            None => self.status().to_string(),
        }
    }

    fn log_status(&self) -> Option<u16> {
        Some(self.status())
    }
}

impl Loggable for str {
    fn log_summary(&self) -> String {
        self.to_owned()
    }
}

impl Loggable for () {
    fn log_summary(&self) -> String {
        "()".to_owned()
    }
}

macro_rules! loggable_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Loggable for $ty {
                fn log_summary(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

loggable_display!(String, bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Stage that logs every call of the stage it wraps.
#[derive(Debug, Clone)]
pub struct Logged<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logged<S> {
    /// Wrap `inner`, logging at `level`.
    #[must_use]
    pub const fn new(inner: S, level: LogLevel) -> Self {
        Self { inner, level }
    }

    /// Configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Stage for Logged<S>
where
    S: Stage,
    S::Input: Loggable,
    S::Output: Loggable,
{
    type Input = S::Input;
    type Output = S::Output;

    async fn run(&self, input: S::Input) -> Result<S::Output> {
        let summary = input.log_summary();
        let span = info_span!("pipeline_call", input = %summary);
        let level = self.level;

        async move {
            match level {
                LogLevel::Debug => debug!(input = %summary, "calling stage"),
                LogLevel::Info => info!(input = %summary, "calling stage"),
            }

            let start = Instant::now();
            let result = self.inner.run(input).await;
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &result {
                Ok(output) => match output.log_status() {
                    Some(status) if status >= 400 => {
                        warn!(status, elapsed_ms, "call completed with HTTP error");
                    }
                    _ => match level {
                        LogLevel::Debug => {
                            debug!(output = %output.log_summary(), elapsed_ms, "call completed");
                        }
                        LogLevel::Info => {
                            info!(output = %output.log_summary(), elapsed_ms, "call completed");
                        }
                    },
                },
                Err(error) => warn!(error = %error, elapsed_ms, "call failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn shape(&self) -> Shape {
        self.inner.shape() | Shape::LOGGING
    }
}
