//! Field-error extraction: any [`Detail`] shape into [`FieldErrors`].
//!
//! # Routing
//!
//! - absent detail: one fallback item under `_global`
//! - scalar or structured item: one item under `_global`
//! - sequence: every element under `_global`, order preserved
//! - field map: every value under its field key, order preserved
//!
//! Field maps nested under a field are flattened to dotted keys
//! (`profile.email`). Sequences nested in item position are flattened in
//! order.
//!
//! # Totality
//!
//! `extract` never fails and never returns an empty map or an empty list.
//! Shapes that carry no item at all (empty sequence, empty map) collapse to
//! the fallback item, and nesting beyond [`MAX_DEPTH`] is cut off with a
//! fallback item at the point of truncation.

use crate::detail::Detail;
use crate::models::{ErrorItem, FieldErrors, GLOBAL_KEY, Params};
use crate::{ErrorCode, ErrorNamespace};
use std::borrow::Cow;

/// Deepest nesting walked before substituting the fallback item.
pub const MAX_DEPTH: usize = 32;

/// Normalize `detail` into field errors under `namespace`.
///
/// `fallback` is the identifier used for absent or empty codes, normally
/// [`GENERIC_ERROR`](crate::GENERIC_ERROR).
pub fn extract(detail: Option<&Detail>, namespace: &ErrorNamespace, fallback: &str) -> FieldErrors {
    let coder = Coder {
        namespace,
        fallback,
    };
    let mut fields = FieldErrors::new();

    if let Some(detail) = detail {
        walk(&coder, None, detail, 0, &mut fields);
    }

    if fields.is_empty() {
        fields.push(GLOBAL_KEY, coder.item("", None));
    }
    fields
}

struct Coder<'a> {
    namespace: &'a ErrorNamespace,
    fallback: &'a str,
}

impl Coder<'_> {
    /// Coerce one raw code (plus params) into a namespaced item.
    fn item(&self, raw: &str, params: Option<&Params>) -> ErrorItem {
        let raw = if raw.trim().is_empty() { self.fallback } else { raw };
        let code = ErrorCode::namespaced(self.namespace, raw);
        match params {
            Some(params) => ErrorItem::with_params(code, params.clone()),
            None => ErrorItem::new(code),
        }
    }
}

fn walk(
    coder: &Coder<'_>,
    field: Option<&str>,
    detail: &Detail,
    depth: usize,
    out: &mut FieldErrors,
) {
    let key = field.unwrap_or(GLOBAL_KEY);

    if depth > MAX_DEPTH {
        out.push(key, coder.item("", None));
        return;
    }

    match detail {
        Detail::Scalar(raw) => out.push(key, coder.item(raw, None)),
        Detail::Structured(raw) => out.push(key, coder.item(&raw.code, raw.params.as_ref())),
        Detail::Sequence(items) => {
            for item in items {
                walk(coder, field, item, depth + 1, out);
            }
        }
        Detail::FieldMap(map) => {
            for (name, value) in map {
                let child: Cow<'_, str> = match field {
                    Some(parent) => Cow::Owned(format!("{}.{}", parent, name)),
                    None => Cow::Borrowed(name.as_str()),
                };
                walk(coder, Some(child.as_ref()), value, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::RawItem;
    use crate::{GENERIC_ERROR, namespaces};

    fn codes(fields: &FieldErrors, key: &str) -> Vec<String> {
        fields
            .get(key)
            .unwrap_or_default()
            .iter()
            .map(|i| i.code().to_string())
            .collect()
    }

    #[test]
    fn absent_detail_yields_global_fallback() {
        let fields = extract(None, &namespaces::TOKEN, GENERIC_ERROR);
        assert_eq!(codes(&fields, GLOBAL_KEY), ["TOKEN.GENERIC_ERROR"]);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn scalar_goes_to_global() {
        let detail = Detail::from("INVALID_CREDENTIALS");
        let fields = extract(Some(&detail), &namespaces::AUTH_FAILED, GENERIC_ERROR);
        assert_eq!(codes(&fields, GLOBAL_KEY), ["AUTH_FAILED.INVALID_CREDENTIALS"]);
    }

    #[test]
    fn sequence_preserves_order_under_global() {
        let detail = Detail::from(vec!["B", "A", "C"]);
        let fields = extract(Some(&detail), &namespaces::API_ERROR, GENERIC_ERROR);
        assert_eq!(
            codes(&fields, GLOBAL_KEY),
            ["API_ERROR.B", "API_ERROR.A", "API_ERROR.C"]
        );
    }

    #[test]
    fn field_map_keeps_keys_and_items() {
        let detail: Detail = [
            ("identifier", Detail::from(vec!["BLANK"])),
            (
                "password",
                Detail::from(vec![RawItem::new("PASSWORD_TOO_SHORT").param("min", 8)]),
            ),
        ]
        .into_iter()
        .collect();

        let fields = extract(Some(&detail), &namespaces::VALIDATION, GENERIC_ERROR);
        assert_eq!(codes(&fields, "identifier"), ["VALIDATION.BLANK"]);

        let password = fields.get("password").unwrap();
        assert_eq!(password[0].code(), "VALIDATION.PASSWORD_TOO_SHORT");
        assert_eq!(
            password[0].params().unwrap()["min"],
            crate::ParamValue::Int(8)
        );
    }

    #[test]
    fn lone_value_under_field_is_wrapped() {
        let detail: Detail = [("email", "INVALID_EMAIL")].into_iter().collect();
        let fields = extract(Some(&detail), &namespaces::VALIDATION, GENERIC_ERROR);
        assert_eq!(codes(&fields, "email"), ["VALIDATION.INVALID_EMAIL"]);
    }

    #[test]
    fn empty_codes_use_fallback() {
        let detail = Detail::from(vec![Detail::from(""), Detail::from(RawItem::default())]);
        let fields = extract(Some(&detail), &namespaces::FORBIDDEN, "DENIED");
        assert_eq!(codes(&fields, GLOBAL_KEY), ["FORBIDDEN.DENIED", "FORBIDDEN.DENIED"]);
    }

    #[test]
    fn already_namespaced_codes_are_kept() {
        let detail = Detail::from("VALIDATION.BLANK");
        let fields = extract(Some(&detail), &namespaces::VALIDATION, GENERIC_ERROR);
        assert_eq!(codes(&fields, GLOBAL_KEY), ["VALIDATION.BLANK"]);
    }

    #[test]
    fn empty_shapes_collapse_to_fallback() {
        for detail in [Detail::Sequence(Vec::new()), Detail::fields()] {
            let fields = extract(Some(&detail), &namespaces::NOT_FOUND, GENERIC_ERROR);
            assert_eq!(codes(&fields, GLOBAL_KEY), ["NOT_FOUND.GENERIC_ERROR"]);
        }
    }

    #[test]
    fn field_with_empty_list_is_dropped() {
        let detail: Detail = [
            ("email", Detail::Sequence(Vec::new())),
            ("password", Detail::from("BLANK")),
        ]
        .into_iter()
        .collect();
        let fields = extract(Some(&detail), &namespaces::VALIDATION, GENERIC_ERROR);
        assert!(fields.get("email").is_none());
        assert!(fields.is_well_formed());
    }

    #[test]
    fn nested_maps_flatten_to_dotted_keys() {
        let profile: Detail = [("email", "INVALID_EMAIL")].into_iter().collect();
        let detail: Detail = [("profile", profile)].into_iter().collect();
        let fields = extract(Some(&detail), &namespaces::VALIDATION, GENERIC_ERROR);
        assert_eq!(codes(&fields, "profile.email"), ["VALIDATION.INVALID_EMAIL"]);
    }

    #[test]
    fn runaway_nesting_is_cut_off() {
        let mut detail = Detail::from("DEEP");
        for _ in 0..(MAX_DEPTH * 2) {
            detail = Detail::Sequence(vec![detail]);
        }
        let fields = extract(Some(&detail), &namespaces::API_ERROR, GENERIC_ERROR);
        assert_eq!(codes(&fields, GLOBAL_KEY), ["API_ERROR.GENERIC_ERROR"]);
    }
}
