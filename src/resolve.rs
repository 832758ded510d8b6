//! Top-level code resolution.
//!
//! The envelope's `code` summarizes the failure with one value. It is the
//! code of the first item of the first non-empty field, in insertion order.
//! The extractor preserves the collaborator's ordering, so whatever the
//! collaborator reported first wins, whether that is a field or `_global`.

use crate::models::FieldErrors;
use crate::{ErrorCode, ErrorNamespace};

/// Pick the single code representing `fields`.
///
/// Empty input resolves to `namespace.fallback`.
pub fn resolve_top_code(fields: &FieldErrors, namespace: &ErrorNamespace, fallback: &str) -> ErrorCode {
    match fields.first_item() {
        Some(item) => item.code().clone(),
        None => ErrorCode::namespaced(namespace, fallback),
    }
}
