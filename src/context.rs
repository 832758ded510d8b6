//! Internal failure context - diagnostic text that never reaches a client.
//!
//! # Trust Boundary
//!
//! A failure's public face is its category and detail payload. Everything a
//! developer needs to debug it (which operation failed, the raw exception
//! text, request identifiers) lives here instead, and is only readable
//! through the borrowed [`FailureLog`](crate::FailureLog) handed to a
//! [`LogSink`](crate::LogSink).
//!
//! The envelope builder has no path to this type.
//!
//! # Memory Strategy
//!
//! Owned strings are cleared via `zeroize` on drop. Borrowed `'static`
//! strings are string literals in the binary and are left alone. This is
//! best-effort clearing against casual memory inspection, not secure
//! allocator-level wiping.

use smallvec::SmallVec;
use std::borrow::Cow;
use zeroize::Zeroize;

/// Metadata value wrapper with zeroization for owned data.
#[derive(Debug)]
pub struct ContextField {
    value: Cow<'static, str>,
}

impl ContextField {
    /// Borrow the value.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.value.as_ref()
    }
}

impl From<&'static str> for ContextField {
    fn from(value: &'static str) -> Self {
        Self {
            value: Cow::Borrowed(value),
        }
    }
}

impl From<String> for ContextField {
    fn from(value: String) -> Self {
        Self {
            value: Cow::Owned(value),
        }
    }
}

impl From<Cow<'static, str>> for ContextField {
    fn from(value: Cow<'static, str>) -> Self {
        Self { value }
    }
}

impl Zeroize for ContextField {
    fn zeroize(&mut self) {
        if let Cow::Owned(ref mut s) = self.value {
            s.zeroize();
        }
    }
}

impl Drop for ContextField {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Metadata pairs; four inline slots cover request id, user id, path and
/// one extra without allocating.
pub type Metadata = SmallVec<[(&'static str, ContextField); 4]>;

/// Internal-only context attached to a [`Failure`](crate::Failure).
#[derive(Debug, Default)]
pub struct FailureContext {
    operation: Option<Cow<'static, str>>,
    message: Option<Cow<'static, str>>,
    metadata: Metadata,
}

impl FailureContext {
    /// Empty context.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the operation that failed, e.g. `"login"`.
    pub fn set_operation(&mut self, operation: impl Into<Cow<'static, str>>) {
        self.operation = Some(operation.into());
    }

    /// Raw diagnostic text, e.g. an exception message.
    pub fn set_message(&mut self, message: impl Into<Cow<'static, str>>) {
        self.message = Some(message.into());
    }

    /// Append a metadata pair. Keys are literals by construction.
    pub fn add_metadata(&mut self, key: &'static str, value: impl Into<Cow<'static, str>>) {
        self.metadata.push((key, ContextField::from(value.into())));
    }

    /// Operation name, if recorded.
    #[inline]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Diagnostic text, if recorded.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Metadata pairs in insertion order.
    #[inline]
    pub fn metadata(&self) -> &[(&'static str, ContextField)] {
        &self.metadata
    }
}

fn zeroize_cow(cow: &mut Option<Cow<'static, str>>) {
    if let Some(Cow::Owned(s)) = cow {
        s.zeroize();
    }
}

impl Zeroize for FailureContext {
    fn zeroize(&mut self) {
        zeroize_cow(&mut self.operation);
        zeroize_cow(&mut self.message);
        for (_, value) in &mut self.metadata {
            value.zeroize();
        }
        self.metadata.clear();
    }
}

impl Drop for FailureContext {
    fn drop(&mut self) {
        self.zeroize();
    }
}
