//! Structured error units: `ErrorItem` and the field-keyed `FieldErrors` map.
//!
//! # Wire Shape
//!
//! ```json
//! {
//!   "identifier": [{"err_code": "VALIDATION.BLANK"}],
//!   "password":   [{"err_code": "VALIDATION.PASSWORD_TOO_SHORT", "err_params": {"min": 8}}]
//! }
//! ```
//!
//! # Invariants
//!
//! - `ErrorItem` is immutable once built; `err_params` is omitted when empty.
//! - `FieldErrors` never maps a key to an empty sequence. Every mutating
//!   method drops empty input instead of inserting it.
//! - Key order is insertion order. The resolver relies on it.
//!
//! # Memory Model
//!
//! Most fields carry one or two errors, so item lists are `SmallVec` with
//! two inline slots; the common case never allocates a separate buffer.

use crate::ErrorCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Reserved field key for errors not attributable to one input field.
pub const GLOBAL_KEY: &str = "_global";

/// Interpolation parameters attached to an error, in insertion order.
pub type Params = IndexMap<String, ParamValue>;

/// Per-field item list with inline storage for the common case.
pub type ItemList = SmallVec<[ErrorItem; 2]>;

// ============================================================================
// Parameter Values
// ============================================================================

/// A scalar interpolation value, e.g. the `8` in `{min: 8}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value (lengths, counts, limits).
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Free text.
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

// ============================================================================
// Error Item
// ============================================================================

/// The atomic structured error: a namespaced code plus optional params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    #[serde(rename = "err_code")]
    code: ErrorCode,
    #[serde(rename = "err_params", default, skip_serializing_if = "Option::is_none")]
    params: Option<Params>,
}

impl ErrorItem {
    /// Item without parameters.
    #[inline]
    pub fn new(code: ErrorCode) -> Self {
        Self { code, params: None }
    }

    /// Item with parameters. An empty map is stored as no params.
    pub fn with_params(code: ErrorCode, params: Params) -> Self {
        Self {
            code,
            params: (!params.is_empty()).then_some(params),
        }
    }

    /// The namespaced code.
    #[inline]
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    /// Interpolation params, if any.
    #[inline]
    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }
}

// ============================================================================
// Field Errors
// ============================================================================

/// Field key to ordered, non-empty list of [`ErrorItem`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, ItemList>);

impl FieldErrors {
    /// Empty map.
    #[inline]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Single `_global` item.
    pub fn global(item: ErrorItem) -> Self {
        let mut fields = Self::new();
        fields.push(GLOBAL_KEY, item);
        fields
    }

    /// Append one item under `field`, keeping first-insertion key order.
    pub fn push(&mut self, field: impl Into<String>, item: ErrorItem) {
        self.0.entry(field.into()).or_default().push(item);
    }

    /// Append several items under `field`.
    ///
    /// Nothing is inserted when `items` is empty, so a field never appears
    /// with an empty list.
    pub fn extend_field(
        &mut self,
        field: impl Into<String>,
        items: impl IntoIterator<Item = ErrorItem>,
    ) {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return;
        }
        self.0.entry(field.into()).or_default().extend(items);
    }

    /// Drop keys whose list is empty.
    ///
    /// Only needed for maps that came off the wire; the mutators here never
    /// create empty lists.
    pub fn remove_empty(&mut self) {
        self.0.retain(|_, items| !items.is_empty());
    }

    /// Whether every key maps to a non-empty list.
    pub fn is_well_formed(&self) -> bool {
        self.0.values().all(|items| !items.is_empty())
    }

    /// No keys at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Items for one field.
    pub fn get(&self, field: &str) -> Option<&[ErrorItem]> {
        self.0.get(field).map(|items| items.as_slice())
    }

    /// Items under [`GLOBAL_KEY`].
    pub fn global_items(&self) -> Option<&[ErrorItem]> {
        self.get(GLOBAL_KEY)
    }

    /// Iterate keys with their items, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorItem])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// First item of the first non-empty entry.
    pub fn first_item(&self) -> Option<&ErrorItem> {
        self.0.values().find_map(|items| items.first())
    }

    /// Total number of items across all fields.
    pub fn item_count(&self) -> usize {
        self.0.values().map(|items| items.len()).sum()
    }
}

impl<K: Into<String>> FromIterator<(K, ErrorItem)> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = (K, ErrorItem)>>(iter: T) -> Self {
        let mut fields = Self::new();
        for (key, item) in iter {
            fields.push(key, item);
        }
        fields
    }
}
