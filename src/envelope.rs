//! The uniform response envelope.
//!
//! Every response, success or failure, has the same JSON shape:
//!
//! ```json
//! {
//!   "success": false,
//!   "code": "VALIDATION.BLANK",
//!   "message": null,
//!   "payload": {},
//!   "errors": { "password": [{ "err_code": "VALIDATION.BLANK" }] },
//!   "meta": {}
//! }
//! ```
//!
//! Assembly is pure: absent `payload`, `errors` and `meta` become empty
//! objects, `message` becomes `null`, and nothing is validated. Callers are
//! trusted to pass a well-formed code.
//!
//! `payload` is always a JSON object. A result that is not an object (a
//! list, a number) is placed under [`PAYLOAD_VALUE_KEY`].

use crate::ErrorCode;
use crate::models::FieldErrors;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding a non-object payload, e.g. `{"value": [1, 2, 3]}`.
pub const PAYLOAD_VALUE_KEY: &str = "value";

fn payload_object(payload: Value) -> Map<String, Value> {
    match payload {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert(PAYLOAD_VALUE_KEY.to_owned(), other);
            map
        }
    }
}

/// JSON body of every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct ResponseEnvelope {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Top-level code, e.g. `AUTH.LOGIN_SUCCESS` or `VALIDATION.BLANK`.
    pub code: String,
    /// Optional human-readable message. Serialized as `null` when absent.
    #[serde(default)]
    pub message: Option<String>,
    /// Operation result data.
    #[serde(default)]
    pub payload: Map<String, Value>,
    /// Per-field errors; empty on success.
    #[serde(default)]
    pub errors: FieldErrors,
    /// Free-form metadata (pagination, request ids).
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl ResponseEnvelope {
    /// Envelope with every optional part at its default.
    pub fn new(success: bool, code: impl Into<String>) -> Self {
        Self {
            success,
            code: code.into(),
            message: None,
            payload: Map::new(),
            errors: FieldErrors::new(),
            meta: Map::new(),
        }
    }

    /// Set the payload. `null` is stored as an empty object; any other
    /// non-object value is wrapped under [`PAYLOAD_VALUE_KEY`].
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload_object(payload);
        self
    }

    /// Set the field errors.
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    /// Set the human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Replace the metadata object.
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Add one metadata entry.
    pub fn with_meta_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// An envelope plus the HTTP status it is sent with.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct WireResponse {
    status: StatusCode,
    body: ResponseEnvelope,
}

impl WireResponse {
    /// Pair a status with a body.
    pub fn new(status: StatusCode, body: ResponseEnvelope) -> Self {
        Self { status, body }
    }

    /// Assemble a response from its parts, substituting defaults for
    /// absent ones.
    pub fn build(
        success: bool,
        code: impl Into<String>,
        payload: Option<Value>,
        errors: Option<FieldErrors>,
        message: Option<String>,
        meta: Option<Map<String, Value>>,
        status: StatusCode,
    ) -> Self {
        let mut body = ResponseEnvelope::new(success, code);
        if let Some(payload) = payload {
            body = body.with_payload(payload);
        }
        body.errors = errors.unwrap_or_default();
        body.message = message;
        body.meta = meta.unwrap_or_default();
        Self::new(status, body)
    }

    /// Successful response with status 200.
    ///
    /// ```rust
    /// use envelope_errors::{WireResponse, success};
    /// use serde_json::json;
    ///
    /// let response = WireResponse::ok(success::LOGIN_SUCCESS, json!({"user_id": 7}));
    /// assert_eq!(response.status().as_u16(), 200);
    /// assert!(response.body().errors.is_empty());
    /// ```
    pub fn ok(code: impl Into<String>, payload: Value) -> Self {
        Self::new(
            StatusCode::OK,
            ResponseEnvelope::new(true, code).with_payload(payload),
        )
    }

    /// Failure response as produced by the dispatcher.
    pub fn failure(status: StatusCode, code: ErrorCode, errors: FieldErrors) -> Self {
        Self::new(
            status,
            ResponseEnvelope::new(false, code.into_string()).with_errors(errors),
        )
    }

    /// HTTP status.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// JSON body.
    #[inline]
    pub fn body(&self) -> &ResponseEnvelope {
        &self.body
    }

    /// Split into status and body.
    pub fn into_parts(self) -> (StatusCode, ResponseEnvelope) {
        (self.status, self.body)
    }

    /// Body as a JSON value.
    ///
    /// # Errors
    ///
    /// Fails only if a payload or meta value cannot be represented in JSON,
    /// which `serde_json::Value` inputs never are.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.body)
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for WireResponse {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = self.into_parts();
        let mut resp = axum::Json(body).into_response();
        *resp.status_mut() = status;
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorItem, GLOBAL_KEY};
    use crate::namespaces;
    use serde_json::json;

    #[test]
    fn build_defaults() {
        let response = WireResponse::build(true, "X", None, None, None, None, StatusCode::OK);
        assert_eq!(
            response.to_json().unwrap(),
            json!({
                "success": true,
                "code": "X",
                "message": null,
                "payload": {},
                "errors": {},
                "meta": {},
            })
        );
    }

    #[test]
    fn build_keeps_supplied_parts() {
        let mut meta = Map::new();
        meta.insert("page".into(), json!(2));
        let response = WireResponse::build(
            true,
            "AUTH.LOGIN_SUCCESS",
            Some(json!({"token": "abc"})),
            None,
            Some("welcome".into()),
            Some(meta),
            StatusCode::OK,
        );

        let body = response.body();
        assert_eq!(Value::Object(body.payload.clone()), json!({"token": "abc"}));
        assert_eq!(body.message.as_deref(), Some("welcome"));
        assert_eq!(body.meta["page"], json!(2));
    }

    #[test]
    fn null_payload_becomes_empty_object() {
        let response = WireResponse::ok("AUTH.LOGOUT_SUCCESS", Value::Null);
        assert!(response.body().payload.is_empty());
    }

    #[test]
    fn failure_serializes_items() {
        let code = ErrorCode::namespaced(&namespaces::VALIDATION, "PASSWORD_TOO_SHORT");
        let mut params = crate::Params::new();
        params.insert("min".into(), 8.into());
        let mut errors = FieldErrors::new();
        errors.push("password", ErrorItem::with_params(code.clone(), params));
        errors.push(GLOBAL_KEY, ErrorItem::new(namespaces::VALIDATION.generic()));

        let response = WireResponse::failure(StatusCode::UNPROCESSABLE_ENTITY, code, errors);
        assert_eq!(
            response.to_json().unwrap(),
            json!({
                "success": false,
                "code": "VALIDATION.PASSWORD_TOO_SHORT",
                "message": null,
                "payload": {},
                "errors": {
                    "password": [{"err_code": "VALIDATION.PASSWORD_TOO_SHORT", "err_params": {"min": 8}}],
                    "_global": [{"err_code": "VALIDATION.GENERIC_ERROR"}],
                },
                "meta": {},
            })
        );
    }

    #[test]
    fn non_object_payloads_are_wrapped() {
        let list = WireResponse::ok("AUTH.GENERIC_SUCCESS", json!([1, 2, 3]));
        assert_eq!(list.to_json().unwrap()["payload"], json!({"value": [1, 2, 3]}));

        let scalar = WireResponse::build(true, "X", Some(json!(7)), None, None, None, StatusCode::OK);
        assert_eq!(scalar.to_json().unwrap()["payload"], json!({"value": 7}));

        let text = ResponseEnvelope::new(true, "X").with_payload(json!("done"));
        assert_eq!(text.payload[PAYLOAD_VALUE_KEY], json!("done"));
    }

    #[test]
    fn non_object_payload_is_rejected_on_deserialize() {
        let parsed = serde_json::from_str::<ResponseEnvelope>(r#"{"success": true, "code": "X", "payload": [1]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn envelope_deserializes_with_missing_parts() {
        let body: ResponseEnvelope = serde_json::from_str(r#"{"success": true, "code": "X"}"#).unwrap();
        assert_eq!(body, ResponseEnvelope::new(true, "X"));
    }

    #[test]
    fn meta_entries_accumulate() {
        let body = ResponseEnvelope::new(true, "X")
            .with_meta_entry("request_id", "req-1")
            .with_meta_entry("page", 3);
        assert_eq!(body.meta.len(), 2);
        assert_eq!(body.meta["page"], json!(3));
    }

    #[cfg(feature = "axum")]
    #[test]
    fn into_response_keeps_status_and_json_body() {
        use axum::response::IntoResponse;

        let code = namespaces::RATE_LIMITED.generic();
        let errors = FieldErrors::global(ErrorItem::new(code.clone()));
        let resp = WireResponse::failure(StatusCode::TOO_MANY_REQUESTS, code, errors).into_response();

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            resp.headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }
}
