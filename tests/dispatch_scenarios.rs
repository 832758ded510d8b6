//! End-to-end scenarios: a collaborator raises a failure, the dispatcher
//! answers with the wire envelope.

use envelope_errors::{
    Detail, Dispatcher, Failure, FailureCategory, LogReason, MemorySink, NoopSink, definitions,
    err_item, field_errors, success, validators,
};
use http::StatusCode;
use serde_json::{Value, json};

fn dispatch(failure: &Failure) -> (StatusCode, Value) {
    let response = Dispatcher::with_sink(NoopSink).dispatch(failure);
    (response.status(), response.to_json().unwrap())
}

#[test]
fn validation_field_map() {
    let detail = Detail::from_json(&json!({"password": ["BLANK"]}));
    let failure = Failure::new(FailureCategory::Validation).with_detail(detail.unwrap());

    let (status, body) = dispatch(&failure);
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({
            "success": false,
            "code": "VALIDATION.BLANK",
            "message": null,
            "payload": {},
            "errors": {"password": [{"err_code": "VALIDATION.BLANK"}]},
            "meta": {},
        })
    );
}

#[test]
fn auth_failure_with_structured_global_item() {
    let detail = Detail::from_json(&json!({"_global": [{"err_code": "INVALID_CREDENTIALS"}]}));
    let failure = Failure::auth_failed(detail.unwrap());

    let (status, body) = dispatch(&failure);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_FAILED.INVALID_CREDENTIALS");
    assert_eq!(
        body["errors"],
        json!({"_global": [{"err_code": "AUTH_FAILED.INVALID_CREDENTIALS"}]})
    );
}

#[test]
fn unclassified_exception_is_generic_500() {
    let failure = Failure::from_error(std::io::Error::other("segfault in libfoo"));

    let (status, body) = dispatch(&failure);
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERVER.GENERIC_ERROR");
    assert_eq!(body["payload"], json!({}));
    assert!(!body.to_string().contains("libfoo"));
}

#[test]
fn api_error_passes_status_through() {
    let failure = Failure::api(Some(405), Some(Detail::from("method not allowed")));

    let (status, body) = dispatch(&failure);
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["code"], "API_ERROR.METHOD_NOT_ALLOWED");
}

#[test]
fn api_error_without_status_is_400() {
    let (status, body) = dispatch(&Failure::api(None, None));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "API_ERROR.GENERIC_ERROR");
    assert_eq!(body["errors"], json!({"_global": [{"err_code": "API_ERROR.GENERIC_ERROR"}]}));
}

#[test]
fn every_category_without_detail_uses_its_fallback() {
    let cases = [
        (FailureCategory::Token, 401, "TOKEN.GENERIC_ERROR"),
        (FailureCategory::AuthFailed, 401, "AUTH_FAILED.GENERIC_ERROR"),
        (FailureCategory::NotAuthenticated, 401, "NOT_AUTH.GENERIC_ERROR"),
        (FailureCategory::Validation, 422, "VALIDATION.GENERIC_ERROR"),
        (FailureCategory::Forbidden, 403, "FORBIDDEN.GENERIC_ERROR"),
        (FailureCategory::NotFound, 404, "NOT_FOUND.GENERIC_ERROR"),
        (FailureCategory::RateLimited, 429, "RATE_LIMITED.GENERIC_ERROR"),
        (FailureCategory::Unclassified, 500, "SERVER.GENERIC_ERROR"),
    ];
    for (category, status, code) in cases {
        let (got_status, body) = dispatch(&Failure::new(category));
        assert_eq!(got_status.as_u16(), status, "{:?}", category);
        assert_eq!(body["code"], code, "{:?}", category);
    }
}

#[test]
fn register_form_with_validators() {
    let username = "al";
    let password = "hunter2";
    let confirmation = "hunter3";

    let mut detail = Detail::fields();
    let username_problems = validators::length(
        username,
        Some((3, &definitions::VALIDATION_USERNAME_TOO_SHORT)),
        Some((32, &definitions::VALIDATION_USERNAME_TOO_LONG)),
    );
    detail = detail.with_field("username", username_problems);
    detail = detail.with_field("password", validators::password_match(password, confirmation));
    detail = detail.with_field("email", validators::blank(None));

    let (status, body) = dispatch(&Failure::validation(detail));
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION.USERNAME_TOO_SHORT");
    assert_eq!(
        body["errors"],
        json!({
            "username": [{"err_code": "VALIDATION.USERNAME_TOO_SHORT", "err_params": {"min": 3}}],
            "password": [{"err_code": "VALIDATION.PASSWORD_MISMATCH"}],
            "email": [{"err_code": "VALIDATION.BLANK"}],
        })
    );
}

#[test]
fn passing_validators_leave_no_empty_fields() {
    let detail = field_errors! {
        "password" => validators::password_match("same", "same"),
        "email" => validators::blank(Some("a@b.c")),
        "username" => vec![err_item!("USERNAME_TAKEN")],
    };

    let (_, body) = dispatch(&Failure::validation(detail));
    assert_eq!(
        body["errors"],
        json!({"username": [{"err_code": "VALIDATION.USERNAME_TAKEN"}]})
    );
}

#[test]
fn lowercase_and_spaced_codes_are_normalized() {
    let (_, body) = dispatch(&Failure::forbidden("admin only"));
    assert_eq!(body["code"], "FORBIDDEN.ADMIN_ONLY");

    let (_, body) = dispatch(&Failure::validation("validation.blank"));
    assert_eq!(body["code"], "VALIDATION.BLANK");
}

#[test]
fn legacy_sequence_detail() {
    let detail = Detail::from_json(&json!(["TOKEN_EXPIRED", "TOKEN_BLACKLISTED"])).unwrap();
    let (status, body) = dispatch(&Failure::token(detail));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN.TOKEN_EXPIRED");
    assert_eq!(body["errors"]["_global"].as_array().map(Vec::len), Some(2));
}

#[test]
fn success_envelope() {
    let response = envelope_errors::WireResponse::ok(success::LOGIN_SUCCESS, json!({"user": "bob"}));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.to_json().unwrap(),
        json!({
            "success": true,
            "code": "AUTH.LOGIN_SUCCESS",
            "message": null,
            "payload": {"user": "bob"},
            "errors": {},
            "meta": {},
        })
    );
}

#[test]
fn logging_side_channel_receives_internal_context() {
    let sink = MemorySink::new(8, 2048);
    let dispatcher = Dispatcher::with_sink(&sink);

    let failure = Failure::unclassified("refresh token table locked")
        .with_operation("refresh")
        .with_metadata("request_id", "req-77");
    let response = dispatcher.dispatch(&failure);

    assert!(!response.to_json().unwrap().to_string().contains("locked"));

    let entry = &sink.get_recent(1)[0];
    assert_eq!(entry.reason, LogReason::Unclassified);
    assert_eq!(entry.code.as_ref(), "SERVER.GENERIC_ERROR");
    assert_eq!(entry.message.as_deref(), Some("refresh token table locked"));
    assert_eq!(entry.operation.as_deref(), Some("refresh"));
}
