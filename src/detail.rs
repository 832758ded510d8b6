//! The `detail` payload a failure carries, as a closed set of shapes.
//!
//! Collaborators describe what went wrong in one of four ways:
//!
//! - `Scalar`: a bare code string (`"BLANK"`)
//! - `Sequence`: several details, all non-field-scoped
//! - `FieldMap`: field name to detail, the richest and preferred shape
//! - `Structured`: an explicit code plus optional params
//!
//! The extractor pattern-matches over these variants; it never inspects
//! runtime types. Payloads arriving as JSON (legacy handlers, upstream
//! services) go through [`Detail::from_json`] first.

use crate::definitions::CodeDef;
use crate::models::{ParamValue, Params};
use indexmap::IndexMap;
use serde_json::Value;

/// Key marking a JSON object as a structured item.
pub const CODE_KEY: &str = "err_code";

/// Key holding a structured item's params.
pub const PARAMS_KEY: &str = "err_params";

/// A structured item as a collaborator raised it: the code is raw (not yet
/// namespaced) and may be empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawItem {
    /// Raw code; namespaced by the extractor.
    pub code: String,
    /// Interpolation params.
    pub params: Option<Params>,
}

impl RawItem {
    /// Item with a code and no params.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            params: None,
        }
    }

    /// Add one param, preserving insertion order.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Catalog entries are raised by identifier only; the failure's category
/// decides the namespace.
impl From<&CodeDef> for RawItem {
    fn from(def: &CodeDef) -> Self {
        Self::new(def.identifier())
    }
}

/// Failure detail payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    /// A bare code.
    Scalar(String),
    /// Ordered details, none scoped to a field.
    Sequence(Vec<Detail>),
    /// Field name to detail, in insertion order.
    FieldMap(IndexMap<String, Detail>),
    /// Explicit code plus params.
    Structured(RawItem),
}

impl Detail {
    /// Start an empty field map.
    pub fn fields() -> Self {
        Self::FieldMap(IndexMap::new())
    }

    /// Add `detail` under `field` when `self` is a field map.
    ///
    /// A repeated field appends to the existing entry. On any other variant
    /// this is a no-op; use [`Detail::fields`] to start a map.
    pub fn with_field(mut self, field: impl Into<String>, detail: impl Into<Detail>) -> Self {
        if let Self::FieldMap(map) = &mut self {
            let detail = detail.into();
            match map.entry(field.into()) {
                indexmap::map::Entry::Occupied(mut slot) => {
                    let existing = std::mem::replace(slot.get_mut(), Detail::Sequence(Vec::new()));
                    let mut merged = match existing {
                        Detail::Sequence(items) => items,
                        other => vec![other],
                    };
                    merged.push(detail);
                    *slot.get_mut() = Detail::Sequence(merged);
                }
                indexmap::map::Entry::Vacant(slot) => {
                    slot.insert(detail);
                }
            }
        }
        self
    }

    /// Convert a JSON payload.
    ///
    /// `null` is absent. Strings, numbers and booleans are scalars. Arrays
    /// are sequences. An object with an `err_code` key is a structured
    /// item; any other object is a field map.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self::Scalar(s.clone())),
            Value::Bool(_) | Value::Number(_) => Some(Self::Scalar(value.to_string())),
            Value::Array(items) => Some(Self::Sequence(
                items.iter().map(Self::from_json_item).collect(),
            )),
            Value::Object(map) if map.contains_key(CODE_KEY) => {
                Some(Self::Structured(raw_item_from_object(map)))
            }
            Value::Object(map) => Some(Self::FieldMap(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json_item(v)))
                    .collect(),
            )),
        }
    }

    /// Like `from_json`, but a `null` in item position becomes an empty
    /// scalar so the extractor substitutes the fallback code.
    fn from_json_item(value: &Value) -> Self {
        Self::from_json(value).unwrap_or_else(|| Self::Scalar(String::new()))
    }
}

fn raw_item_from_object(map: &serde_json::Map<String, Value>) -> RawItem {
    let code = match map.get(CODE_KEY) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let params = match map.get(PARAMS_KEY) {
        Some(Value::Object(raw)) => {
            let params: Params = raw
                .iter()
                .filter_map(|(k, v)| param_from_json(v).map(|p| (k.clone(), p)))
                .collect();
            (!params.is_empty()).then_some(params)
        }
        _ => None,
    };

    RawItem { code, params }
}

fn param_from_json(value: &Value) -> Option<ParamValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(ParamValue::Bool(*b)),
        Value::Number(n) => Some(
            n.as_i64()
                .map(ParamValue::Int)
                .or_else(|| n.as_f64().map(ParamValue::Float))
                .unwrap_or_else(|| ParamValue::Str(n.to_string())),
        ),
        Value::String(s) => Some(ParamValue::Str(s.clone())),
        // Nested structures are kept as their JSON text
        Value::Array(_) | Value::Object(_) => Some(ParamValue::Str(value.to_string())),
    }
}

impl From<&str> for Detail {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<String> for Detail {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<RawItem> for Detail {
    fn from(value: RawItem) -> Self {
        Self::Structured(value)
    }
}

impl From<&CodeDef> for Detail {
    fn from(def: &CodeDef) -> Self {
        Self::Structured(RawItem::from(def))
    }
}

impl<T: Into<Detail>> From<Vec<T>> for Detail {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Detail>> FromIterator<(K, V)> for Detail {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::fields(), |detail, (k, v)| detail.with_field(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions;
    use serde_json::json;

    #[test]
    fn json_null_is_absent() {
        assert_eq!(Detail::from_json(&Value::Null), None);
    }

    #[test]
    fn json_scalars() {
        assert_eq!(Detail::from_json(&json!("BLANK")), Some(Detail::Scalar("BLANK".into())));
        assert_eq!(Detail::from_json(&json!(42)), Some(Detail::Scalar("42".into())));
    }

    #[test]
    fn json_object_with_err_code_is_structured() {
        let detail = Detail::from_json(&json!({"err_code": "PASSWORD_TOO_SHORT", "err_params": {"min": 8}}));
        let expected = RawItem::new("PASSWORD_TOO_SHORT").param("min", 8);
        assert_eq!(detail, Some(Detail::Structured(expected)));
    }

    #[test]
    fn json_field_map_keeps_order() {
        let detail = Detail::from_json(&json!({"password": ["BLANK"], "identifier": "REQUIRED"})).unwrap();
        let Detail::FieldMap(map) = detail else {
            panic!("expected field map");
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["password", "identifier"]);
    }

    #[test]
    fn json_null_items_become_empty_scalars() {
        let detail = Detail::from_json(&json!([null, "X"])).unwrap();
        assert_eq!(
            detail,
            Detail::Sequence(vec![Detail::Scalar(String::new()), Detail::Scalar("X".into())])
        );
    }

    #[test]
    fn nested_params_are_stringified() {
        let detail = Detail::from_json(&json!({"err_code": "X", "err_params": {"allowed": [1, 2]}})).unwrap();
        let Detail::Structured(item) = detail else {
            panic!("expected structured item");
        };
        let params = item.params.unwrap();
        assert_eq!(params["allowed"], ParamValue::Str("[1,2]".into()));
    }

    #[test]
    fn with_field_merges_repeated_keys() {
        let detail = Detail::fields()
            .with_field("username", &definitions::VALIDATION_USERNAME_TAKEN)
            .with_field("username", &definitions::VALIDATION_USERNAME_INVALID_FORMAT);

        let Detail::FieldMap(map) = detail else {
            panic!("expected field map");
        };
        assert_eq!(
            map["username"],
            Detail::Sequence(vec![
                Detail::Structured(RawItem::new("USERNAME_TAKEN")),
                Detail::Structured(RawItem::new("USERNAME_INVALID_FORMAT")),
            ])
        );
    }

    #[test]
    fn code_def_raises_identifier_only() {
        let item = RawItem::from(&definitions::AUTH_INVALID_CREDENTIALS);
        assert_eq!(item.code, "INVALID_CREDENTIALS");
    }
}
