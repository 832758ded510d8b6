//! Logging side channel for failures the dispatcher could not attribute.
//!
//! # Port
//!
//! The dispatcher never talks to a logger directly. It is handed a
//! [`LogSink`] at construction and calls it with a [`FailureLog`] that
//! borrows from the failure being translated:
//!
//! - Borrows with an explicit lifetime and CANNOT outlive the failure
//! - Carries the internal context the envelope never shows
//! - Renders fields bounded to a configurable length
//!
//! Sinks are best-effort. A panicking sink is caught by the dispatcher and
//! ignored; it never changes the response.
//!
//! # Provided Sinks
//!
//! - [`TracingSink`]: one `tracing` error event per failure (default)
//! - [`NoopSink`]: discards everything
//! - [`MemorySink`](crate::MemorySink): bounded in-memory ring buffer

use crate::context::ContextField;
use crate::{ErrorCode, FailureCategory, NormalizeError};
use http::StatusCode;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Default cap for any individual rendered field.
pub const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Truncation indicator appended to truncated strings.
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// `tracing` target used by [`TracingSink`].
pub const LOG_TARGET: &str = "envelope_errors";

/// Why the dispatcher logged a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogReason {
    /// Failure raised without a recognized category.
    Unclassified,
    /// Framework-level failure mapped to `API_ERROR`.
    ApiError,
    /// Classification itself failed; the SERVER fallback was sent.
    GuardFallback,
    /// Any other category, logged only when configured to log everything.
    Classified,
}

impl LogReason {
    /// Stable label for structured log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::ApiError => "api_error",
            Self::GuardFallback => "guard_fallback",
            Self::Classified => "classified",
        }
    }
}

/// Structured log record borrowing from a [`Failure`](crate::Failure).
#[derive(Debug)]
pub struct FailureLog<'a> {
    pub(crate) reason: LogReason,
    pub(crate) category: &'a FailureCategory,
    pub(crate) status: StatusCode,
    pub(crate) code: &'a ErrorCode,
    pub(crate) operation: Option<&'a str>,
    pub(crate) message: Option<&'a str>,
    pub(crate) source: Option<&'a (dyn Error + Send + Sync + 'static)>,
    pub(crate) metadata: &'a [(&'static str, ContextField)],
    pub(crate) fault: Option<&'a NormalizeError>,
    pub(crate) max_field_len: usize,
}

impl<'a> FailureLog<'a> {
    /// Why this record exists.
    #[inline]
    pub const fn reason(&self) -> LogReason {
        self.reason
    }

    /// Category the failure was raised with.
    #[inline]
    pub const fn category(&self) -> &FailureCategory {
        self.category
    }

    /// HTTP status that was sent.
    #[inline]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Top-level code that was sent.
    #[inline]
    pub const fn code(&self) -> &ErrorCode {
        self.code
    }

    /// Operation the failure occurred in, if recorded.
    #[inline]
    pub const fn operation(&self) -> Option<&str> {
        self.operation
    }

    /// Internal message, if recorded.
    #[inline]
    pub const fn message(&self) -> Option<&str> {
        self.message
    }

    /// Underlying error, if the failure wrapped one.
    #[inline]
    pub fn source(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.source
    }

    /// Internal key/value context.
    #[inline]
    pub const fn metadata(&self) -> &[(&'static str, ContextField)] {
        self.metadata
    }

    /// Why classification failed, on the guard fallback path.
    #[inline]
    pub const fn fault(&self) -> Option<&NormalizeError> {
        self.fault
    }

    /// Write the record without allocating for untruncated fields.
    ///
    /// Format: `[CODE] status=NNN category=... reason=... fault='...'
    /// operation='...' message='...' source='...' key='value'...`
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        let limit = self.max_field_len;
        write!(
            f,
            "[{}] status={} category={} reason={}",
            self.code,
            self.status.as_u16(),
            self.category.label(),
            self.reason.as_str()
        )?;

        if let Some(fault) = self.fault {
            write!(f, " fault='{}'", fault)?;
        }
        if let Some(operation) = self.operation {
            write!(f, " operation='{}'", truncate_with_indicator(operation, limit))?;
        }
        if let Some(message) = self.message {
            write!(f, " message='{}'", truncate_with_indicator(message, limit))?;
        }
        if let Some(source) = self.source {
            let rendered = source.to_string();
            write!(f, " source='{}'", truncate_with_indicator(&rendered, limit))?;
        }
        for (key, value) in self.metadata {
            write!(f, " {}='{}'", key, truncate_with_indicator(value.as_str(), limit))?;
        }
        Ok(())
    }

    /// Render to an owned string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_to(&mut out);
        out
    }
}

// ============================================================================
// Sink Port
// ============================================================================

/// Logging capability injected into the dispatcher.
///
/// Implementations must tolerate concurrent calls; the dispatcher is shared
/// across request handlers.
pub trait LogSink: Send + Sync {
    /// Record one failure. Must not block for long.
    fn log_failure(&self, log: &FailureLog<'_>);
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn log_failure(&self, log: &FailureLog<'_>) {
        (**self).log_failure(log);
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn log_failure(&self, log: &FailureLog<'_>) {
        (**self).log_failure(log);
    }
}

impl<T: LogSink + ?Sized> LogSink for Box<T> {
    fn log_failure(&self, log: &FailureLog<'_>) {
        (**self).log_failure(log);
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log_failure(&self, _log: &FailureLog<'_>) {}
}

/// Emits one `tracing` error event per record.
///
/// Structured fields: `code`, `status`, `category`, `reason`, `fault`,
/// `operation`, `internal_message` and `source`. The event's own `message`
/// is the rendered [`FailureLog::write_to`] line.
///
/// Subscriber installation (console, file, JSON) belongs to the host
/// application.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log_failure(&self, log: &FailureLog<'_>) {
        let limit = log.max_field_len;
        let rendered_source = log.source().map(|s| s.to_string());
        let operation = log.operation().map(|s| truncate_with_indicator(s, limit));
        let message = log.message().map(|s| truncate_with_indicator(s, limit));
        let source = rendered_source
            .as_deref()
            .map(|s| truncate_with_indicator(s, limit));
        let line = log.render();

        tracing::error!(
            target: LOG_TARGET,
            code = %log.code(),
            status = log.status().as_u16(),
            category = log.category().label(),
            reason = log.reason().as_str(),
            fault = log.fault().map(tracing::field::display),
            operation = operation.as_deref(),
            internal_message = message.as_deref(),
            source = source.as_deref(),
            "{}",
            line
        );
    }
}

/// Truncate a string for display to bound log volume.
///
/// If the string exceeds `max_len` bytes it is cut at a UTF-8 boundary and
/// the truncation indicator is appended; the result never exceeds
/// `max_len`. Returns `Cow::Borrowed` when nothing was cut.
pub(crate) fn truncate_with_indicator(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.len() <= max_len {
        return Cow::Borrowed(s);
    }

    let max_content_len = max_len.saturating_sub(TRUNCATION_INDICATOR.len());

    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}
