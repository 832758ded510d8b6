//! Pre-defined error and success codes for the authentication API.
//!
//! # Taxonomy & Governance
//!
//! This file is the catalog of identifiers clients are allowed to branch on.
//! Every entry is a [`CodeDef`] const: a frozen namespace reference plus an
//! UPPER_SNAKE_CASE identifier checked at compile time. Collaborators raise
//! failures with these defs (or their raw identifier), and the extractor
//! namespaces whatever they pass.
//!
//! Identifiers are stable. Renaming one is a breaking API change; add a new
//! def instead and keep the old one until clients have migrated.
//!
//! # Fallbacks
//!
//! Each namespace owns exactly one `*_GENERIC` entry whose identifier is
//! [`GENERIC_ERROR`](crate::GENERIC_ERROR). The dispatcher uses it when a
//! failure carries no usable code.

use crate::{ErrorCode, ErrorNamespace, define_error_codes, namespaces};
use std::fmt;

// ============================================================================
// Code Definition (compile-time catalog entry)
// ============================================================================

/// A catalog entry: namespace + identifier, both `'static`.
///
/// # Compile-time Guarantees
///
/// [`CodeDef::const_new`] panics (a compile error in const context) if the
/// identifier is empty or contains anything other than `A-Z`, `0-9` and `_`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CodeDef {
    namespace: &'static ErrorNamespace,
    identifier: &'static str,
}

impl CodeDef {
    /// Create a catalog entry with compile-time validation.
    ///
    /// # Panics
    ///
    /// Panics if `identifier` is not UPPER_SNAKE_CASE. In const contexts
    /// this is a compile error.
    pub const fn const_new(namespace: &'static ErrorNamespace, identifier: &'static str) -> Self {
        assert!(
            is_upper_snake(identifier),
            "Error identifier must be non-empty UPPER_SNAKE_CASE"
        );
        Self {
            namespace,
            identifier,
        }
    }

    /// Namespace this entry belongs to.
    #[inline]
    pub const fn namespace(&self) -> &'static ErrorNamespace {
        self.namespace
    }

    /// Identifier without namespace, e.g. `"BLANK"`.
    #[inline]
    pub const fn identifier(&self) -> &'static str {
        self.identifier
    }

    /// Full namespaced code, e.g. `VALIDATION.BLANK`.
    #[inline]
    pub fn code(&self) -> ErrorCode {
        ErrorCode::namespaced(self.namespace, self.identifier)
    }
}

impl fmt::Display for CodeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.namespace.prefix(), self.identifier)
    }
}

const fn is_upper_snake(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !(b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_') {
            return false;
        }
        i += 1;
    }
    true
}

// -----------------------------------------------------------------------------
// TOKEN - access/refresh token problems
// -----------------------------------------------------------------------------
define_error_codes! {
    &namespaces::TOKEN => {
        TOKEN_GENERIC = "GENERIC_ERROR",
    }
}

// -----------------------------------------------------------------------------
// AUTH_FAILED - credentials supplied and rejected
// -----------------------------------------------------------------------------
define_error_codes! {
    &namespaces::AUTH_FAILED => {
        AUTH_FAILED_GENERIC          = "GENERIC_ERROR",
        AUTH_INVALID_CREDENTIALS     = "INVALID_CREDENTIALS",
        AUTH_ACCOUNT_DISABLED        = "ACCOUNT_DISABLED",
        AUTH_REFRESH_TOKEN_MISSING   = "REFRESH_TOKEN_MISSING",
        AUTH_INVALID_PASSWORD        = "INVALID_PASSWORD",
    }
}

// -----------------------------------------------------------------------------
// NOT_AUTH - no credentials
// -----------------------------------------------------------------------------
define_error_codes! {
    &namespaces::NOT_AUTH => {
        NOT_AUTH_GENERIC             = "GENERIC_ERROR",
        NOT_AUTH_USER_NOT_LOGGED_IN  = "USER_NOT_LOGGED_IN",
    }
}

// -----------------------------------------------------------------------------
// VALIDATION - field validation
// -----------------------------------------------------------------------------
define_error_codes! {
    &namespaces::VALIDATION => {
        VALIDATION_GENERIC           = "GENERIC_ERROR",
        VALIDATION_REQUIRED          = "REQUIRED",
        VALIDATION_BLANK             = "BLANK",
        VALIDATION_USERNAME_TOO_SHORT = "USERNAME_TOO_SHORT",
        VALIDATION_USERNAME_TOO_LONG = "USERNAME_TOO_LONG",
        VALIDATION_USERNAME_INVALID_FORMAT = "USERNAME_INVALID_FORMAT",
        VALIDATION_INVALID_EMAIL     = "INVALID_EMAIL",
        VALIDATION_PASSWORD_TOO_SHORT = "PASSWORD_TOO_SHORT",
        VALIDATION_PASSWORD_TOO_LONG = "PASSWORD_TOO_LONG",
        VALIDATION_PASSWORD_MISMATCH = "PASSWORD_MISMATCH",
        VALIDATION_EMAIL_TAKEN       = "EMAIL_TAKEN",
        VALIDATION_USERNAME_TAKEN    = "USERNAME_TAKEN",
        VALIDATION_PASSWORD_SAME_AS_OLD = "PASSWORD_SAME_AS_OLD",
    }
}

// -----------------------------------------------------------------------------
// Remaining namespaces - fallback only
// -----------------------------------------------------------------------------
define_error_codes! {
    &namespaces::FORBIDDEN => { FORBIDDEN_GENERIC = "GENERIC_ERROR" }
}
define_error_codes! {
    &namespaces::NOT_FOUND => { NOT_FOUND_GENERIC = "GENERIC_ERROR" }
}
define_error_codes! {
    &namespaces::RATE_LIMITED => { RATE_LIMITED_GENERIC = "GENERIC_ERROR" }
}
define_error_codes! {
    &namespaces::API_ERROR => { API_ERROR_GENERIC = "GENERIC_ERROR" }
}
define_error_codes! {
    &namespaces::SERVER => { SERVER_GENERIC = "GENERIC_ERROR" }
}

/// Success codes returned with `success: true`.
///
/// These live outside the error namespaces; `AUTH` is not an error
/// namespace and never reaches the extractor.
pub mod success {
    /// Generic success for auth endpoints.
    pub const GENERIC_SUCCESS: &str = "AUTH.GENERIC_SUCCESS";
    /// Access token reissued from a refresh token.
    pub const TOKEN_REFRESHED: &str = "AUTH.TOKEN_REFRESHED";
    /// Login accepted.
    pub const LOGIN_SUCCESS: &str = "AUTH.LOGIN_SUCCESS";
    /// Session ended.
    pub const LOGOUT_SUCCESS: &str = "AUTH.LOGOUT_SUCCESS";
    /// Account created.
    pub const REGISTER_SUCCESS: &str = "AUTH.REGISTER_SUCCESS";
    /// Account deleted.
    pub const USER_DELETED: &str = "AUTH.USER_DELETED";
    /// Password updated.
    pub const PASSWORD_CHANGED: &str = "AUTH.PASSWORD_CHANGED";
    /// Username updated.
    pub const USERNAME_CHANGED: &str = "AUTH.USERNAME_CHANGED";
    /// Email updated.
    pub const EMAIL_CHANGED: &str = "AUTH.EMAIL_CHANGED";
}

/// Fallback entry for every namespace, in classification priority order.
pub const GENERIC_FALLBACKS: [&CodeDef; 9] = [
    &TOKEN_GENERIC,
    &AUTH_FAILED_GENERIC,
    &NOT_AUTH_GENERIC,
    &VALIDATION_GENERIC,
    &FORBIDDEN_GENERIC,
    &NOT_FOUND_GENERIC,
    &RATE_LIMITED_GENERIC,
    &API_ERROR_GENERIC,
    &SERVER_GENERIC,
];
