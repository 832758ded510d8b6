//! Field validators producing raw error items.
//!
//! Each helper returns the items for one check, empty when the value
//! passes. Collect them per field and raise a validation failure:
//!
//! ```rust
//! use envelope_errors::{Detail, Failure, definitions, validators};
//!
//! let username = "al";
//! let mut detail = Detail::fields();
//! let problems = validators::length(
//!     username,
//!     Some((3, &definitions::VALIDATION_USERNAME_TOO_SHORT)),
//!     Some((32, &definitions::VALIDATION_USERNAME_TOO_LONG)),
//! );
//! if !problems.is_empty() {
//!     detail = detail.with_field("username", problems);
//! }
//! let failure = Failure::validation(detail);
//! # let _ = failure;
//! ```

use crate::definitions::{self, CodeDef};
use crate::detail::RawItem;

/// `REQUIRED` when the value was not supplied at all.
pub fn required<T>(value: Option<T>) -> Vec<RawItem> {
    match value {
        Some(_) => Vec::new(),
        None => vec![RawItem::from(&definitions::VALIDATION_REQUIRED)],
    }
}

/// `BLANK` when the value is absent or the empty string.
///
/// Whitespace is not blank; trimming is the caller's decision.
pub fn blank(value: Option<&str>) -> Vec<RawItem> {
    match value {
        Some(v) if !v.is_empty() => Vec::new(),
        _ => vec![RawItem::from(&definitions::VALIDATION_BLANK)],
    }
}

/// Length bounds in characters.
///
/// Each bound pairs a limit with the code raised when it is violated; the
/// limit is attached as the `min` or `max` param.
pub fn length(
    value: &str,
    min: Option<(usize, &CodeDef)>,
    max: Option<(usize, &CodeDef)>,
) -> Vec<RawItem> {
    let len = value.chars().count();
    let mut items = Vec::new();

    if let Some((limit, def)) = min {
        if len < limit {
            items.push(RawItem::from(def).param("min", limit));
        }
    }
    if let Some((limit, def)) = max {
        if len > limit {
            items.push(RawItem::from(def).param("max", limit));
        }
    }
    items
}

/// `PASSWORD_MISMATCH` when the confirmation differs.
pub fn password_match(password: &str, confirmation: &str) -> Vec<RawItem> {
    if password == confirmation {
        Vec::new()
    } else {
        vec![RawItem::from(&definitions::VALIDATION_PASSWORD_MISMATCH)]
    }
}
