//! Convenience macros for building catalog entries and failure details.
//!
//! # Usage
//!
//! ```rust
//! use envelope_errors::{Failure, err_item, field_errors};
//!
//! let failure = Failure::validation(field_errors! {
//!     "identifier" => vec![err_item!("BLANK")],
//!     "password" => vec![err_item!("PASSWORD_TOO_SHORT", min = 8)],
//! });
//! # let _ = failure;
//! ```
//!
//! Codes passed to these macros are raw identifiers. The namespace comes
//! from the failure's category when the dispatcher extracts them.

/// Build a [`RawItem`](crate::RawItem) from a code and optional params.
///
/// Params keep the order they are written in.
///
/// ```rust
/// # use envelope_errors::{err_item, ParamValue};
/// let item = err_item!("USERNAME_TOO_LONG", max = 32, hint = "shorten");
/// assert_eq!(item.code, "USERNAME_TOO_LONG");
/// let params = item.params.unwrap();
/// assert_eq!(params["max"], ParamValue::Int(32));
/// assert_eq!(params.get_index(1).unwrap().0, "hint");
/// ```
#[macro_export]
macro_rules! err_item {
    ($code:expr $(,)?) => {
        $crate::RawItem::new($code)
    };
    ($code:expr, $( $key:ident = $value:expr ),+ $(,)?) => {
        $crate::RawItem::new($code)
            $( .param(stringify!($key), $value) )+
    };
}

/// Build a field-map [`Detail`](crate::Detail).
///
/// Values are anything convertible into a `Detail`: a code string, an
/// [`err_item!`], a catalog def, or a `Vec` of those. A repeated field name
/// appends to the earlier entry.
///
/// ```rust
/// # use envelope_errors::{definitions, err_item, field_errors, Detail};
/// let detail = field_errors! {
///     "email" => &definitions::VALIDATION_INVALID_EMAIL,
///     "password" => vec![err_item!("PASSWORD_TOO_SHORT", min = 8)],
/// };
/// assert!(matches!(detail, Detail::FieldMap(ref map) if map.len() == 2));
/// ```
#[macro_export]
macro_rules! field_errors {
    () => {
        $crate::Detail::fields()
    };
    ($( $field:expr => $detail:expr ),+ $(,)?) => {
        $crate::Detail::fields()
            $( .with_field($field, $detail) )+
    };
}

/// Define one catalog entry.
///
/// # Example
///
/// ```rust
/// # use envelope_errors::{define_error_code, namespaces};
/// define_error_code!(VALIDATION_NICKNAME_TAKEN, &namespaces::VALIDATION, "NICKNAME_TAKEN");
/// assert_eq!(VALIDATION_NICKNAME_TAKEN.to_string(), "VALIDATION.NICKNAME_TAKEN");
/// ```
///
/// A malformed identifier fails to compile:
///
/// ```rust,compile_fail
/// # use envelope_errors::{define_error_code, namespaces};
/// define_error_code!(BAD, &namespaces::VALIDATION, "not upper");
/// ```
#[macro_export]
macro_rules! define_error_code {
    ($name:ident, $namespace:expr, $ident:literal) => {
        #[doc = concat!("Catalog entry `", $ident, "`.")]
        pub const $name: $crate::CodeDef = $crate::CodeDef::const_new($namespace, $ident);
    };
}

/// Define several catalog entries within the same namespace.
///
/// # Example
///
/// ```rust
/// # use envelope_errors::{define_error_codes, namespaces};
/// define_error_codes! {
///     &namespaces::FORBIDDEN => {
///         FORBIDDEN_ADMIN_ONLY = "ADMIN_ONLY",
///         FORBIDDEN_READ_ONLY = "READ_ONLY",
///     }
/// }
/// assert_eq!(FORBIDDEN_READ_ONLY.identifier(), "READ_ONLY");
/// ```
#[macro_export]
macro_rules! define_error_codes {
    ($namespace:expr => { $( $name:ident = $ident:literal ),+ $(,)? }) => {
        $(
            $crate::define_error_code!($name, $namespace, $ident);
        )+
    };
}
