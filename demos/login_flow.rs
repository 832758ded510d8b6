//! A login handler raising categorized failures, and the envelopes they
//! turn into.

use envelope_errors::{
    Detail, DispatchConfig, Dispatcher, Failure, MemorySink, Result, TracingSink, WireResponse,
    definitions, success, validators,
};
use serde_json::json;

struct Credentials<'a> {
    identifier: Option<&'a str>,
    password: Option<&'a str>,
}

fn check_form(form: &Credentials<'_>) -> Result<()> {
    let mut detail = Detail::fields();
    let mut invalid = false;

    for (field, value) in [("identifier", form.identifier), ("password", form.password)] {
        let problems = validators::blank(value);
        if !problems.is_empty() {
            invalid = true;
            detail = detail.with_field(field, problems);
        }
    }

    if invalid {
        return Err(Failure::validation(detail).with_operation("login"));
    }
    Ok(())
}

fn login(form: &Credentials<'_>) -> Result<WireResponse> {
    check_form(form)?;

    match (form.identifier, form.password) {
        (Some("locked@example.com"), _) => {
            Err(Failure::auth_failed(&definitions::AUTH_ACCOUNT_DISABLED).with_operation("login"))
        }
        (Some("alice@example.com"), Some("correct horse")) => {
            Ok(WireResponse::ok(success::LOGIN_SUCCESS, json!({"user_id": 7})))
        }
        (Some("bob@example.com"), _) => Err(Failure::unclassified("user store timed out after 30s")
            .with_operation("login")
            .with_metadata("backend", "users-primary")),
        _ => Err(Failure::auth_failed(&definitions::AUTH_INVALID_CREDENTIALS)),
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(true).init();

    // Log every category while developing; keep a copy in memory too
    let config = DispatchConfig::default().with_log_all_categories(true);
    let dispatcher = Dispatcher::with_sink(TracingSink).with_config(config);
    let recorder = MemorySink::new(32, 1024);
    let recording = Dispatcher::with_sink(recorder.clone());

    let attempts = [
        ("empty form", Credentials { identifier: None, password: Some("") }),
        ("wrong password", Credentials { identifier: Some("alice@example.com"), password: Some("tr0ub4dor") }),
        ("disabled account", Credentials { identifier: Some("locked@example.com"), password: Some("x") }),
        ("backend down", Credentials { identifier: Some("bob@example.com"), password: Some("x") }),
        ("success", Credentials { identifier: Some("alice@example.com"), password: Some("correct horse") }),
    ];

    for (label, form) in &attempts {
        let response = match login(form) {
            Ok(response) => response,
            Err(failure) => {
                let _ = recording.dispatch(&failure);
                dispatcher.dispatch(&failure)
            }
        };

        println!("--- {} ---", label);
        println!("status: {}", response.status());
        match response.to_json() {
            Ok(body) => println!("{:#}\n", body),
            Err(e) => println!("unserializable body: {}\n", e),
        }
    }

    println!("--- recorded by the memory sink ---");
    for entry in recorder.get_all() {
        println!(
            "[{}] {} operation={:?} message={:?}",
            entry.code,
            entry.reason.as_str(),
            entry.operation,
            entry.message
        );
    }
}
