#![no_main]

use envelope_errors::{Detail, Dispatcher, Failure, FailureCategory, NoopSink};
use libfuzzer_sys::fuzz_target;

const CATEGORIES: [FailureCategory; 9] = [
    FailureCategory::Token,
    FailureCategory::AuthFailed,
    FailureCategory::NotAuthenticated,
    FailureCategory::Validation,
    FailureCategory::Forbidden,
    FailureCategory::NotFound,
    FailureCategory::RateLimited,
    FailureCategory::Api { status: None },
    FailureCategory::Unclassified,
];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(rest) else {
        return;
    };

    let category = CATEGORIES[selector as usize % CATEGORIES.len()];
    let failure = match Detail::from_json(&value) {
        Some(detail) => Failure::new(category).with_detail(detail),
        None => Failure::new(category),
    };

    let response = Dispatcher::with_sink(NoopSink).dispatch(&failure);
    let body = response.body();

    assert!(!body.success);
    assert_eq!(response.status(), category.status());
    assert!(body.code.starts_with(category.namespace().prefix()));
    assert!(body.errors.is_well_formed());
    assert!(!body.errors.is_empty());
});
