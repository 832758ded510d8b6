//! # Envelope Errors
//!
//! Translate every failure an API handler can raise into one uniform JSON
//! envelope with a stable, namespaced error code.
//!
//! ## Design Philosophy
//!
//! 1. **Failures carry a category, not a type hierarchy.** Collaborators
//!    raise a [`Failure`] tagged with one [`FailureCategory`]; the
//!    [`Dispatcher`] is a total match over that closed set.
//! 2. **Codes are public contract.** Every code is `NAMESPACE.IDENTIFIER`
//!    with a namespace from the frozen set in [`namespaces`].
//! 3. **Internal text never reaches the client.** Operation names, raw
//!    error messages and source errors live in a zeroized
//!    [`FailureContext`] and are only handed to a [`LogSink`].
//! 4. **The error path cannot crash.** Dispatch is guarded; anything that
//!    goes wrong while translating a failure becomes
//!    `SERVER.GENERIC_ERROR` with status 500.
//!
//! ## Quick Start
//!
//! ```rust
//! use envelope_errors::{Dispatcher, Failure, NoopSink, Result, err_item, field_errors};
//!
//! fn register(password: &str) -> Result<()> {
//!     if password.len() < 8 {
//!         return Err(Failure::validation(field_errors! {
//!             "password" => vec![err_item!("PASSWORD_TOO_SHORT", min = 8)],
//!         })
//!         .with_operation("register"));
//!     }
//!     Ok(())
//! }
//!
//! let dispatcher = Dispatcher::with_sink(NoopSink);
//! let failure = register("short").unwrap_err();
//! let response = dispatcher.dispatch(&failure);
//!
//! assert_eq!(response.status().as_u16(), 422);
//! assert_eq!(response.body().code, "VALIDATION.PASSWORD_TOO_SHORT");
//!
//! // External display (safe for clients and generic error pages):
//! assert_eq!(failure.to_string(), "Validation failure (VALIDATION)");
//! ```
//!
//! ## Wrapping Unexpected Errors
//!
//! ```rust
//! use envelope_errors::{Dispatcher, Failure, MemorySink};
//!
//! let sink = MemorySink::new(16, 1024);
//! let dispatcher = Dispatcher::with_sink(sink.clone());
//!
//! let io = std::io::Error::other("disk quota exceeded");
//! let failure = Failure::from_error(io).with_operation("upload_avatar");
//! let response = dispatcher.dispatch(&failure);
//!
//! // The client sees only the generic server code...
//! assert_eq!(response.body().code, "SERVER.GENERIC_ERROR");
//! // ...while the sink received the real cause.
//! assert_eq!(sink.get_recent(1)[0].source.as_deref(), Some("disk quota exceeded"));
//! ```
//!
//! ## Features
//!
//! - `axum`: `IntoResponse` for [`WireResponse`] and [`Failure`]

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::result;
use zeroize::Zeroize;

pub mod codes;
pub mod context;
pub mod convenience;
pub mod definitions;
pub mod detail;
pub mod dispatch;
pub mod envelope;
pub mod extract;
pub mod logging;
pub mod models;
pub mod resolve;
pub mod ring_buffer;
pub mod validators;

pub use codes::*;
pub use context::*;
pub use definitions::*;
pub use detail::*;
pub use dispatch::*;
pub use envelope::*;
pub use extract::*;
pub use logging::*;
pub use models::*;
pub use resolve::*;
pub use ring_buffer::*;

/// Type alias for Results using our failure type.
pub type Result<T> = result::Result<T, Failure>;

/// A category-tagged failure raised by collaborator code.
///
/// # Key Properties
///
/// - The category alone decides namespace and status
/// - `detail` is the only part that reaches the client, after namespacing
/// - Internal context is zeroized on drop and only exposed to log sinks
/// - No implicit conversions from other error types; wrap explicitly with
///   [`Failure::from_error`] or [`Failure::with_source`]
#[must_use = "failures should be dispatched or propagated"]
pub struct Failure {
    category: FailureCategory,
    detail: Option<Detail>,
    context: FailureContext,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl Failure {
    /// Failure with a category and no detail.
    #[inline]
    pub fn new(category: FailureCategory) -> Self {
        Self {
            category,
            detail: None,
            context: FailureContext::new(),
            source: None,
        }
    }

    /// Failure with a category and a detail payload.
    #[inline]
    pub fn with_category_detail(category: FailureCategory, detail: impl Into<Detail>) -> Self {
        Self::new(category).with_detail(detail)
    }

    // One constructor per category so call sites read as what went wrong
    // and can be grepped for, e.g. `Failure::forbidden(`.

    /// Token invalid, expired or revoked.
    pub fn token(detail: impl Into<Detail>) -> Self {
        Self::with_category_detail(FailureCategory::Token, detail)
    }

    /// Credentials rejected.
    pub fn auth_failed(detail: impl Into<Detail>) -> Self {
        Self::with_category_detail(FailureCategory::AuthFailed, detail)
    }

    /// No credentials supplied.
    pub fn not_authenticated(detail: impl Into<Detail>) -> Self {
        Self::with_category_detail(FailureCategory::NotAuthenticated, detail)
    }

    /// Input failed validation. `detail` is normally a field map.
    pub fn validation(detail: impl Into<Detail>) -> Self {
        Self::with_category_detail(FailureCategory::Validation, detail)
    }

    /// Permission denied.
    pub fn forbidden(detail: impl Into<Detail>) -> Self {
        Self::with_category_detail(FailureCategory::Forbidden, detail)
    }

    /// Resource not found.
    pub fn not_found(detail: impl Into<Detail>) -> Self {
        Self::with_category_detail(FailureCategory::NotFound, detail)
    }

    /// Too many requests.
    pub fn rate_limited(detail: impl Into<Detail>) -> Self {
        Self::with_category_detail(FailureCategory::RateLimited, detail)
    }

    /// Framework-level failure with the framework's own status, if any.
    pub fn api(status: Option<u16>, detail: Option<Detail>) -> Self {
        let mut failure = Self::new(FailureCategory::Api { status });
        failure.detail = detail;
        failure
    }

    /// Unexpected failure. `message` is internal diagnostic text and is
    /// never sent to the client.
    pub fn unclassified(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(FailureCategory::Unclassified).with_internal_message(message)
    }

    /// Wrap any error as an unclassified failure.
    ///
    /// The error is kept as the source; its text only reaches log sinks.
    pub fn from_error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::new(FailureCategory::Unclassified).with_source(error)
    }

    /// Replace the detail payload.
    #[inline]
    pub fn with_detail(mut self, detail: impl Into<Detail>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Record the failing operation, e.g. `"login"`.
    #[inline]
    pub fn with_operation(mut self, operation: impl Into<Cow<'static, str>>) -> Self {
        self.context.set_operation(operation);
        self
    }

    /// Record internal diagnostic text.
    #[inline]
    pub fn with_internal_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.context.set_message(message);
        self
    }

    /// Add tracking metadata (request ids, user ids).
    ///
    /// Mutates in place; no cloning.
    #[inline]
    pub fn with_metadata(mut self, key: &'static str, value: impl Into<Cow<'static, str>>) -> Self {
        self.context.add_metadata(key, value);
        self
    }

    /// Attach the underlying error.
    pub fn with_source<E>(mut self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(error));
        self
    }

    /// Category the failure was raised with.
    #[inline]
    pub const fn category(&self) -> &FailureCategory {
        &self.category
    }

    /// Detail payload, if any.
    #[inline]
    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    /// Internal context. Never serialize this into a response.
    #[inline]
    pub const fn context(&self) -> &FailureContext {
        &self.context
    }

    /// Underlying error with its thread-safety bounds intact.
    #[inline]
    pub fn source_ref(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl Drop for Failure {
    /// Drop the source first (it may hold sensitive text), then zeroize the
    /// context. Panics from a foreign source's destructor are contained.
    #[inline(never)]
    fn drop(&mut self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.source = None;
            self.context.zeroize();
        }));
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("category", &self.category)
            .field("detail", &self.detail)
            .field("context", &"<REDACTED>")
            .field("source", &self.source.as_ref().map(|_| "<PRESENT>"))
            .finish()
    }
}

impl fmt::Display for Failure {
    /// External display, safe for untrusted viewers.
    ///
    /// Format: `"{Category} failure ({NAMESPACE})"`, e.g.
    /// `"Authentication failure (AUTH_FAILED)"`. Detail, context and source
    /// are never included.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failure ({})",
            self.category.display_name(),
            self.category.namespace()
        )
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Failure {
    /// Dispatch through a default [`Dispatcher`] (logging via `tracing`).
    fn into_response(self) -> axum::response::Response {
        Dispatcher::new().dispatch(&self).into_response()
    }
}
