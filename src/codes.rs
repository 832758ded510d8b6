//! Error code namespace - every public error code is `NAMESPACE.IDENTIFIER`.
//!
//! Clients branch on these strings, so they are part of the API contract.
//! The namespace says which kind of failure happened, the identifier says
//! what exactly went wrong: `VALIDATION.BLANK`, `AUTH_FAILED.INVALID_CREDENTIALS`.
//!
//! # Namespace Structure
//!
//! - **TOKEN**: Access/refresh token invalid, expired or blacklisted
//! - **AUTH_FAILED**: Credentials were supplied but rejected
//! - **NOT_AUTH**: No credentials were supplied
//! - **VALIDATION**: Request input failed field validation
//! - **FORBIDDEN**: Authenticated but not permitted
//! - **NOT_FOUND**: Resource does not exist
//! - **RATE_LIMITED**: Request throttled
//! - **API_ERROR**: Any other recognized framework-level failure
//! - **SERVER**: Unclassified failure, including failures while classifying
//!
//! # Governance
//!
//! Namespaces are a closed set enforced through `ErrorNamespace`, whose
//! fields are private. Only the const instances in [`namespaces`] exist, so
//! no code path can invent a new top-level category at runtime.
//!
//! Every namespace owns exactly one fallback identifier, [`GENERIC_ERROR`],
//! used when a failure carries no specific code.
//!
//! # Example
//!
//! ```rust
//! use envelope_errors::{ErrorCode, namespaces};
//!
//! let code = ErrorCode::namespaced(&namespaces::VALIDATION, "password too short");
//! assert_eq!(code.as_str(), "VALIDATION.PASSWORD_TOO_SHORT");
//!
//! // Already namespaced codes are left alone
//! let again = ErrorCode::namespaced(&namespaces::VALIDATION, code.as_str());
//! assert_eq!(again, code);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Fallback identifier shared by every namespace.
pub const GENERIC_ERROR: &str = "GENERIC_ERROR";

/// Separator between namespace and identifier.
pub const NAMESPACE_SEPARATOR: char = '.';

// ============================================================================
// Error Namespace (Frozen Identity)
// ============================================================================

/// Error namespace type - enforces the closed taxonomy.
///
/// Namespaces are locked at compile-time with no runtime construction:
/// - Private fields prevent user construction
/// - Only const instances are exported (see [`namespaces`])
/// - Compared by reference identity or by name, never built from input
///
/// This type does not implement Copy or Clone. Namespaces exist only as
/// const statics and are always passed as `&'static ErrorNamespace`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ErrorNamespace {
    name: &'static str,
    prefix: &'static str,
    _private: (),
}

impl ErrorNamespace {
    /// Internal constructor - not part of the public API.
    ///
    /// `prefix` must be `name` followed by [`NAMESPACE_SEPARATOR`]; the
    /// namespace table in this module is the only caller.
    #[doc(hidden)]
    pub const fn __internal_new(name: &'static str, prefix: &'static str) -> Self {
        Self {
            name,
            prefix,
            _private: (),
        }
    }

    /// Namespace name as it appears on the wire, e.g. `"VALIDATION"`.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.name
    }

    /// Namespace name plus separator, e.g. `"VALIDATION."`.
    #[inline]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// The namespace-wide fallback code, e.g. `VALIDATION.GENERIC_ERROR`.
    #[inline]
    pub fn generic(&self) -> ErrorCode {
        ErrorCode::namespaced(self, GENERIC_ERROR)
    }

    /// Look up a namespace by its wire name.
    ///
    /// Returns `None` for anything outside the closed set.
    pub fn from_name(name: &str) -> Option<&'static ErrorNamespace> {
        namespaces::ALL.iter().copied().find(|ns| ns.name == name)
    }
}

impl fmt::Display for ErrorNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Canonical namespace instances.
///
/// These are the **only** `ErrorNamespace` values that can exist.
pub mod namespaces {
    use super::ErrorNamespace;

    /// Token invalid, expired or blacklisted.
    pub const TOKEN: ErrorNamespace = ErrorNamespace::__internal_new("TOKEN", "TOKEN.");

    /// Authentication attempted and rejected.
    pub const AUTH_FAILED: ErrorNamespace =
        ErrorNamespace::__internal_new("AUTH_FAILED", "AUTH_FAILED.");

    /// No credentials supplied.
    pub const NOT_AUTH: ErrorNamespace = ErrorNamespace::__internal_new("NOT_AUTH", "NOT_AUTH.");

    /// Field validation.
    pub const VALIDATION: ErrorNamespace =
        ErrorNamespace::__internal_new("VALIDATION", "VALIDATION.");

    /// Permission denied.
    pub const FORBIDDEN: ErrorNamespace =
        ErrorNamespace::__internal_new("FORBIDDEN", "FORBIDDEN.");

    /// Resource not found.
    pub const NOT_FOUND: ErrorNamespace =
        ErrorNamespace::__internal_new("NOT_FOUND", "NOT_FOUND.");

    /// Throttled.
    pub const RATE_LIMITED: ErrorNamespace =
        ErrorNamespace::__internal_new("RATE_LIMITED", "RATE_LIMITED.");

    /// Recognized framework failure without a dedicated namespace.
    pub const API_ERROR: ErrorNamespace =
        ErrorNamespace::__internal_new("API_ERROR", "API_ERROR.");

    /// Unclassified failure.
    pub const SERVER: ErrorNamespace = ErrorNamespace::__internal_new("SERVER", "SERVER.");

    /// Every namespace, in classification priority order.
    pub const ALL: [&ErrorNamespace; 9] = [
        &TOKEN,
        &AUTH_FAILED,
        &NOT_AUTH,
        &VALIDATION,
        &FORBIDDEN,
        &NOT_FOUND,
        &RATE_LIMITED,
        &API_ERROR,
        &SERVER,
    ];
}

// ============================================================================
// Identifier Normalization
// ============================================================================

/// Normalize a raw identifier: trim, uppercase, collapse every run of
/// whitespace into a single `_`.
///
/// Uppercasing follows the full Unicode mapping, so `é` becomes `É` and
/// `ß` becomes `SS`. Returns `Cow::Borrowed` when the input is already
/// normalized, which is the common case for catalog codes.
pub fn normalize_identifier(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();
    let already_normal = trimmed
        .chars()
        .all(|c| !c.is_whitespace() && is_uppercase_fixpoint(c));
    if already_normal {
        return Cow::Borrowed(trimmed);
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_space = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        out.extend(c.to_uppercase());
    }
    Cow::Owned(out)
}

/// Whether uppercasing leaves `c` unchanged. Digits, `_` and caseless
/// letters qualify along with uppercase ones.
#[inline]
fn is_uppercase_fixpoint(c: char) -> bool {
    if c.is_ascii() {
        return !c.is_ascii_lowercase();
    }
    let mut upper = c.to_uppercase();
    upper.next() == Some(c) && upper.next().is_none()
}

// ============================================================================
// Code Violations
// ============================================================================

/// Reasons a string is not a well-formed `NAMESPACE.IDENTIFIER` code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeViolation {
    /// No separator between namespace and identifier.
    MissingSeparator,
    /// Namespace segment is not one of the closed set.
    UnknownNamespace {
        /// The rejected segment.
        namespace: String,
    },
    /// Identifier segment is empty.
    EmptyIdentifier,
    /// Identifier contains whitespace or letters that are not uppercase.
    NotNormalized {
        /// The offending identifier.
        identifier: String,
    },
}

impl fmt::Display for CodeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => write!(f, "error code has no namespace separator"),
            Self::UnknownNamespace { namespace } => {
                write!(f, "unknown error namespace '{}'", namespace)
            }
            Self::EmptyIdentifier => write!(f, "error code identifier is empty"),
            Self::NotNormalized { identifier } => {
                write!(f, "identifier '{}' is not UPPER_SNAKE_CASE", identifier)
            }
        }
    }
}

impl std::error::Error for CodeViolation {}

// ============================================================================
// Error Code
// ============================================================================

/// A namespaced public error code such as `VALIDATION.BLANK`.
///
/// # Construction APIs
///
/// - [`ErrorCode::namespaced`]: normalizes and prefixes a raw code. Never
///   fails; empty input becomes the namespace's `GENERIC_ERROR`.
/// - [`ErrorCode::parse`]: strict validation of an already complete code.
///
/// Serializes as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(String);

impl ErrorCode {
    /// Build a code in `namespace` from a raw identifier.
    ///
    /// Idempotent: a raw value already carrying this namespace's prefix is
    /// kept as-is, so `VALIDATION.BLANK` never becomes
    /// `VALIDATION.VALIDATION.BLANK`. A prefix from a *different* namespace
    /// is treated as part of the identifier.
    pub fn namespaced(namespace: &ErrorNamespace, raw: &str) -> Self {
        let normalized = normalize_identifier(raw);
        let identifier: &str = if normalized.is_empty() {
            GENERIC_ERROR
        } else {
            normalized.as_ref()
        };

        if let Some(rest) = identifier.strip_prefix(namespace.prefix()) {
            if !rest.is_empty() {
                return Self(identifier.to_owned());
            }
            // "VALIDATION." alone carries no identifier
            return Self(format!("{}{}", namespace.prefix(), GENERIC_ERROR));
        }

        let mut code = String::with_capacity(namespace.prefix().len() + identifier.len());
        code.push_str(namespace.prefix());
        code.push_str(identifier);
        Self(code)
    }

    /// Validate a complete code string.
    ///
    /// # Errors
    ///
    /// Returns a [`CodeViolation`] if the namespace is unknown, the
    /// identifier is empty, or the identifier is not normalized.
    pub fn parse(code: &str) -> Result<Self, CodeViolation> {
        let (namespace, identifier) = code
            .split_once(NAMESPACE_SEPARATOR)
            .ok_or(CodeViolation::MissingSeparator)?;

        if ErrorNamespace::from_name(namespace).is_none() {
            return Err(CodeViolation::UnknownNamespace {
                namespace: namespace.to_owned(),
            });
        }
        if identifier.is_empty() {
            return Err(CodeViolation::EmptyIdentifier);
        }
        if normalize_identifier(identifier) != identifier {
            return Err(CodeViolation::NotNormalized {
                identifier: identifier.to_owned(),
            });
        }
        Ok(Self(code.to_owned()))
    }

    /// Borrow the full code string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace segment, e.g. `"VALIDATION"`.
    pub fn namespace_str(&self) -> &str {
        self.0
            .split_once(NAMESPACE_SEPARATOR)
            .map_or(self.0.as_str(), |(ns, _)| ns)
    }

    /// Identifier segment, e.g. `"BLANK"`.
    pub fn identifier(&self) -> &str {
        self.0
            .split_once(NAMESPACE_SEPARATOR)
            .map_or("", |(_, id)| id)
    }

    /// Whether this code belongs to `namespace`.
    #[inline]
    pub fn is_in(&self, namespace: &ErrorNamespace) -> bool {
        self.0.starts_with(namespace.prefix())
    }

    /// Consume into the owned string.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ErrorCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ErrorCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ErrorCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    /// Deserialization does not validate; wire data from older servers may
    /// carry codes outside the current catalog.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

// ============================================================================
// Tests
// ============================================================================
