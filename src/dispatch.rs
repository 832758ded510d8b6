//! Failure classification and the guarded dispatch boundary.
//!
//! # Classification Table
//!
//! | Category           | Namespace      | Status                       |
//! |--------------------|----------------|------------------------------|
//! | `Token`            | `TOKEN`        | 401                          |
//! | `AuthFailed`       | `AUTH_FAILED`  | 401                          |
//! | `NotAuthenticated` | `NOT_AUTH`     | 401                          |
//! | `Validation`       | `VALIDATION`   | 422                          |
//! | `Forbidden`        | `FORBIDDEN`    | 403                          |
//! | `NotFound`         | `NOT_FOUND`    | 404                          |
//! | `RateLimited`      | `RATE_LIMITED` | 429                          |
//! | `Api`              | `API_ERROR`    | underlying 4xx/5xx, else 400 |
//! | `Unclassified`     | `SERVER`       | 500                          |
//!
//! Every namespace falls back to `GENERIC_ERROR`. The table is a static
//! array; nothing about classification is decided at runtime except the
//! `Api` pass-through status.
//!
//! # Guard
//!
//! [`Dispatcher::dispatch`] never panics and never returns an error. If
//! extraction or resolution fails, returns malformed output, or panics, the
//! response degrades to `SERVER.GENERIC_ERROR` with status 500. Panic
//! recovery relies on unwinding; under `panic = "abort"` a panicking
//! normalizer aborts the process instead.

use crate::envelope::WireResponse;
use crate::extract::extract;
use crate::logging::{FailureLog, LogReason, LogSink, MAX_FIELD_OUTPUT_LEN, TracingSink};
use crate::models::{ErrorItem, FieldErrors};
use crate::resolve::resolve_top_code;
use crate::{Detail, ErrorCode, ErrorNamespace, Failure, GENERIC_ERROR, namespaces};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

// ============================================================================
// Failure Category
// ============================================================================

/// The closed set of failure kinds a collaborator can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Access or refresh token invalid, expired or revoked.
    Token,
    /// Credentials supplied and rejected.
    AuthFailed,
    /// No credentials supplied.
    NotAuthenticated,
    /// Input failed validation.
    Validation,
    /// Authenticated but not permitted.
    Forbidden,
    /// Resource does not exist.
    NotFound,
    /// Too many requests.
    RateLimited,
    /// Framework-level failure (bad method, unparseable body, ...).
    ///
    /// `status` is the framework's own status; anything outside 400..=599
    /// maps to 400.
    Api {
        /// Underlying HTTP status, if the framework reported one.
        status: Option<u16>,
    },
    /// Anything else. Always logged.
    Unclassified,
}

struct Classification {
    namespace: &'static ErrorNamespace,
    fallback: &'static str,
    status: StatusCode,
    label: &'static str,
    display_name: &'static str,
}

/// Indexed by [`FailureCategory::index`], in classification priority order.
static CLASSIFICATION: [Classification; 9] = [
    Classification {
        namespace: &namespaces::TOKEN,
        fallback: GENERIC_ERROR,
        status: StatusCode::UNAUTHORIZED,
        label: "token",
        display_name: "Token",
    },
    Classification {
        namespace: &namespaces::AUTH_FAILED,
        fallback: GENERIC_ERROR,
        status: StatusCode::UNAUTHORIZED,
        label: "auth_failed",
        display_name: "Authentication",
    },
    Classification {
        namespace: &namespaces::NOT_AUTH,
        fallback: GENERIC_ERROR,
        status: StatusCode::UNAUTHORIZED,
        label: "not_authenticated",
        display_name: "Not authenticated",
    },
    Classification {
        namespace: &namespaces::VALIDATION,
        fallback: GENERIC_ERROR,
        status: StatusCode::UNPROCESSABLE_ENTITY,
        label: "validation",
        display_name: "Validation",
    },
    Classification {
        namespace: &namespaces::FORBIDDEN,
        fallback: GENERIC_ERROR,
        status: StatusCode::FORBIDDEN,
        label: "forbidden",
        display_name: "Permission",
    },
    Classification {
        namespace: &namespaces::NOT_FOUND,
        fallback: GENERIC_ERROR,
        status: StatusCode::NOT_FOUND,
        label: "not_found",
        display_name: "Lookup",
    },
    Classification {
        namespace: &namespaces::RATE_LIMITED,
        fallback: GENERIC_ERROR,
        status: StatusCode::TOO_MANY_REQUESTS,
        label: "rate_limited",
        display_name: "Rate limit",
    },
    Classification {
        namespace: &namespaces::API_ERROR,
        fallback: GENERIC_ERROR,
        status: StatusCode::BAD_REQUEST,
        label: "api_error",
        display_name: "Request",
    },
    Classification {
        namespace: &namespaces::SERVER,
        fallback: GENERIC_ERROR,
        status: StatusCode::INTERNAL_SERVER_ERROR,
        label: "unclassified",
        display_name: "Server",
    },
];

impl FailureCategory {
    #[inline]
    const fn index(&self) -> usize {
        match self {
            Self::Token => 0,
            Self::AuthFailed => 1,
            Self::NotAuthenticated => 2,
            Self::Validation => 3,
            Self::Forbidden => 4,
            Self::NotFound => 5,
            Self::RateLimited => 6,
            Self::Api { .. } => 7,
            Self::Unclassified => 8,
        }
    }

    #[inline]
    fn entry(&self) -> &'static Classification {
        &CLASSIFICATION[self.index()]
    }

    /// Namespace every code of this category is prefixed with.
    #[inline]
    pub fn namespace(&self) -> &'static ErrorNamespace {
        self.entry().namespace
    }

    /// Identifier used when the detail carries no usable code.
    #[inline]
    pub fn fallback(&self) -> &'static str {
        self.entry().fallback
    }

    /// HTTP status the response is sent with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api { status } => api_status(*status),
            other => other.entry().status,
        }
    }

    /// Stable snake_case label for log fields.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.entry().label
    }

    /// Human-readable category name for sanitized display.
    #[inline]
    pub fn display_name(&self) -> &'static str {
        self.entry().display_name
    }

    /// Whether this category is logged even without `log_all_categories`.
    #[inline]
    pub const fn log_reason(&self) -> Option<LogReason> {
        match self {
            Self::Api { .. } => Some(LogReason::ApiError),
            Self::Unclassified => Some(LogReason::Unclassified),
            _ => None,
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn api_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::BAD_REQUEST)
}

// ============================================================================
// Normalization Seam
// ============================================================================

/// Why classification could not produce a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The extraction step failed.
    Extraction {
        /// Short description of the failure.
        reason: Cow<'static, str>,
    },
    /// The resolution step failed.
    Resolution {
        /// Short description of the failure.
        reason: Cow<'static, str>,
    },
    /// Extraction returned an empty map or a field with no items.
    MalformedFields,
    /// A step panicked.
    Panicked,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction { reason } => write!(f, "field error extraction failed: {}", reason),
            Self::Resolution { reason } => write!(f, "top code resolution failed: {}", reason),
            Self::MalformedFields => f.write_str("extraction produced malformed field errors"),
            Self::Panicked => f.write_str("normalization panicked"),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// The extract and resolve steps, behind a trait so the dispatcher's guard
/// can be exercised with a faulty implementation.
pub trait Normalizer: Send + Sync {
    /// Turn a detail payload into field errors.
    fn extract(
        &self,
        detail: Option<&Detail>,
        namespace: &ErrorNamespace,
        fallback: &str,
    ) -> Result<FieldErrors, NormalizeError>;

    /// Pick the top-level code for `fields`.
    fn resolve(
        &self,
        fields: &FieldErrors,
        namespace: &ErrorNamespace,
        fallback: &str,
    ) -> Result<ErrorCode, NormalizeError>;
}

/// [`extract`] plus [`resolve_top_code`]. Both are total, so this never
/// returns an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormalizer;

impl Normalizer for StandardNormalizer {
    fn extract(
        &self,
        detail: Option<&Detail>,
        namespace: &ErrorNamespace,
        fallback: &str,
    ) -> Result<FieldErrors, NormalizeError> {
        Ok(extract(detail, namespace, fallback))
    }

    fn resolve(
        &self,
        fields: &FieldErrors,
        namespace: &ErrorNamespace,
        fallback: &str,
    ) -> Result<ErrorCode, NormalizeError> {
        Ok(resolve_top_code(fields, namespace, fallback))
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Dispatcher settings. Deserializable so hosts can embed it in their own
/// configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Log every dispatched failure, not only unclassified and API ones.
    #[serde(default)]
    pub log_all_categories: bool,
    /// Byte cap for each rendered log field.
    #[serde(default = "default_max_log_field_len")]
    pub max_log_field_len: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            log_all_categories: false,
            max_log_field_len: default_max_log_field_len(),
        }
    }
}

fn default_max_log_field_len() -> usize {
    MAX_FIELD_OUTPUT_LEN
}

impl DispatchConfig {
    /// Toggle logging for every category.
    pub fn with_log_all_categories(mut self, enabled: bool) -> Self {
        self.log_all_categories = enabled;
        self
    }

    /// Set the per-field byte cap for log output.
    pub fn with_max_log_field_len(mut self, len: usize) -> Self {
        self.max_log_field_len = len;
        self
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Output of a successful classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFailure {
    /// HTTP status for the response.
    pub status: StatusCode,
    /// Top-level code.
    pub code: ErrorCode,
    /// Per-field errors, never empty.
    pub errors: FieldErrors,
}

impl ClassifiedFailure {
    /// The SERVER fallback used when classification fails.
    pub fn server_fallback() -> Self {
        let code = namespaces::SERVER.generic();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            errors: FieldErrors::global(ErrorItem::new(code.clone())),
            code,
        }
    }

    /// Assemble the failure envelope.
    pub fn into_response(self) -> WireResponse {
        WireResponse::failure(self.status, self.code, self.errors)
    }
}

/// Translates [`Failure`]s into wire responses.
///
/// Holds no per-request state; share one instance across handlers.
///
/// # Example
///
/// ```rust
/// use envelope_errors::{Dispatcher, Failure, NoopSink, field_errors};
///
/// let dispatcher = Dispatcher::with_sink(NoopSink);
/// let response = dispatcher.dispatch(&Failure::validation(field_errors! {
///     "password" => vec!["BLANK"],
/// }));
///
/// assert_eq!(response.status().as_u16(), 422);
/// assert_eq!(response.body().code, "VALIDATION.BLANK");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<S = TracingSink, N = StandardNormalizer> {
    sink: S,
    normalizer: N,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Dispatcher logging through `tracing`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: LogSink> Dispatcher<S> {
    /// Dispatcher logging through `sink`.
    pub fn with_sink(sink: S) -> Self {
        Self {
            sink,
            normalizer: StandardNormalizer,
            config: DispatchConfig::default(),
        }
    }
}

impl<S: LogSink, N: Normalizer> Dispatcher<S, N> {
    /// Replace the extract/resolve implementation.
    pub fn with_normalizer<M: Normalizer>(self, normalizer: M) -> Dispatcher<S, M> {
        Dispatcher {
            sink: self.sink,
            normalizer,
            config: self.config,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    #[inline]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The log sink.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Classify, extract and resolve without the guard.
    ///
    /// # Errors
    ///
    /// Returns the normalizer's error, or [`NormalizeError::MalformedFields`]
    /// if extraction produced an empty map or an empty field list. Panics
    /// inside the normalizer propagate; use [`Dispatcher::dispatch`] at
    /// request boundaries.
    pub fn classify(&self, failure: &Failure) -> Result<ClassifiedFailure, NormalizeError> {
        let category = failure.category();
        let namespace = category.namespace();
        let fallback = category.fallback();

        let errors = self.normalizer.extract(failure.detail(), namespace, fallback)?;
        if errors.is_empty() || !errors.is_well_formed() {
            return Err(NormalizeError::MalformedFields);
        }
        let code = self.normalizer.resolve(&errors, namespace, fallback)?;

        Ok(ClassifiedFailure {
            status: category.status(),
            code,
            errors,
        })
    }

    /// Translate `failure` into a response. Never fails.
    pub fn dispatch(&self, failure: &Failure) -> WireResponse {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.classify(failure)))
            .unwrap_or(Err(NormalizeError::Panicked));

        match outcome {
            Ok(classified) => {
                let reason = failure.category().log_reason().or(self
                    .config
                    .log_all_categories
                    .then_some(LogReason::Classified));
                if let Some(reason) = reason {
                    self.emit(failure, reason, &classified, None);
                }
                classified.into_response()
            }
            Err(fault) => {
                let fallback = ClassifiedFailure::server_fallback();
                self.emit(failure, LogReason::GuardFallback, &fallback, Some(&fault));
                fallback.into_response()
            }
        }
    }

    /// Hand a record to the sink. A panicking sink is ignored.
    fn emit(
        &self,
        failure: &Failure,
        reason: LogReason,
        classified: &ClassifiedFailure,
        fault: Option<&NormalizeError>,
    ) {
        let context = failure.context();
        let log = FailureLog {
            reason,
            category: failure.category(),
            status: classified.status,
            code: &classified.code,
            operation: context.operation(),
            message: context.message(),
            source: failure.source_ref(),
            metadata: context.metadata(),
            fault,
            max_field_len: self.config.max_log_field_len,
        };
        let _ = panic::catch_unwind(AssertUnwindSafe(|| self.sink.log_failure(&log)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemorySink, NoopSink, field_errors};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingExtract;

    impl Normalizer for FailingExtract {
        fn extract(
            &self,
            _: Option<&Detail>,
            _: &ErrorNamespace,
            _: &str,
        ) -> Result<FieldErrors, NormalizeError> {
            Err(NormalizeError::Extraction {
                reason: "injected".into(),
            })
        }

        fn resolve(
            &self,
            fields: &FieldErrors,
            namespace: &ErrorNamespace,
            fallback: &str,
        ) -> Result<ErrorCode, NormalizeError> {
            StandardNormalizer.resolve(fields, namespace, fallback)
        }
    }

    struct PanickingResolve;

    impl Normalizer for PanickingResolve {
        fn extract(
            &self,
            detail: Option<&Detail>,
            namespace: &ErrorNamespace,
            fallback: &str,
        ) -> Result<FieldErrors, NormalizeError> {
            StandardNormalizer.extract(detail, namespace, fallback)
        }

        fn resolve(&self, _: &FieldErrors, _: &ErrorNamespace, _: &str) -> Result<ErrorCode, NormalizeError> {
            panic!("injected resolver panic");
        }
    }

    struct EmptyExtract;

    impl Normalizer for EmptyExtract {
        fn extract(&self, _: Option<&Detail>, _: &ErrorNamespace, _: &str) -> Result<FieldErrors, NormalizeError> {
            Ok(FieldErrors::new())
        }

        fn resolve(
            &self,
            fields: &FieldErrors,
            namespace: &ErrorNamespace,
            fallback: &str,
        ) -> Result<ErrorCode, NormalizeError> {
            StandardNormalizer.resolve(fields, namespace, fallback)
        }
    }

    struct PanickingSink(AtomicUsize);

    impl LogSink for PanickingSink {
        fn log_failure(&self, _: &FailureLog<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
            panic!("sink down");
        }
    }

    fn assert_server_fallback(response: &WireResponse) {
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.body().success);
        assert_eq!(response.body().code, "SERVER.GENERIC_ERROR");
    }

    #[test]
    fn table_matches_categories() {
        let cases = [
            (FailureCategory::Token, "TOKEN", 401),
            (FailureCategory::AuthFailed, "AUTH_FAILED", 401),
            (FailureCategory::NotAuthenticated, "NOT_AUTH", 401),
            (FailureCategory::Validation, "VALIDATION", 422),
            (FailureCategory::Forbidden, "FORBIDDEN", 403),
            (FailureCategory::NotFound, "NOT_FOUND", 404),
            (FailureCategory::RateLimited, "RATE_LIMITED", 429),
            (FailureCategory::Api { status: None }, "API_ERROR", 400),
            (FailureCategory::Unclassified, "SERVER", 500),
        ];
        for (category, namespace, status) in cases {
            assert_eq!(category.namespace().as_str(), namespace);
            assert_eq!(category.fallback(), GENERIC_ERROR);
            assert_eq!(category.status().as_u16(), status);
        }
    }

    #[test]
    fn api_status_passes_through_error_codes_only() {
        assert_eq!(api_status(Some(405)), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(api_status(Some(503)), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_status(Some(200)), StatusCode::BAD_REQUEST);
        assert_eq!(api_status(Some(302)), StatusCode::BAD_REQUEST);
        assert_eq!(api_status(Some(42)), StatusCode::BAD_REQUEST);
        assert_eq!(api_status(None), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn classify_validation() {
        let dispatcher = Dispatcher::with_sink(NoopSink);
        let failure = Failure::validation(field_errors! { "password" => vec!["BLANK"] });

        let classified = dispatcher.classify(&failure).unwrap();
        assert_eq!(classified.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(classified.code, "VALIDATION.BLANK");
        assert_eq!(classified.errors.get("password").unwrap()[0].code(), "VALIDATION.BLANK");
    }

    #[test]
    fn extraction_error_degrades_to_server() {
        let sink = MemorySink::new(8, 1024);
        let dispatcher = Dispatcher::with_sink(&sink).with_normalizer(FailingExtract);

        let response = dispatcher.dispatch(&Failure::validation("BLANK"));
        assert_server_fallback(&response);

        let entry = &sink.get_recent(1)[0];
        assert_eq!(entry.reason, LogReason::GuardFallback);
        assert_eq!(entry.category, "validation");
    }

    #[test]
    fn resolver_panic_degrades_to_server() {
        let dispatcher = Dispatcher::with_sink(NoopSink).with_normalizer(PanickingResolve);
        let failure = Failure::new(FailureCategory::NotFound);

        let unguarded = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.classify(&failure)));
        assert!(unguarded.is_err());
        assert_server_fallback(&dispatcher.dispatch(&failure));
    }

    #[test]
    fn empty_extraction_is_rejected() {
        let dispatcher = Dispatcher::with_sink(NoopSink).with_normalizer(EmptyExtract);
        assert_eq!(
            dispatcher.classify(&Failure::new(FailureCategory::Forbidden)),
            Err(NormalizeError::MalformedFields)
        );
        assert_server_fallback(&dispatcher.dispatch(&Failure::new(FailureCategory::Forbidden)));
    }

    #[test]
    fn panicking_sink_does_not_change_response() {
        let sink = PanickingSink(AtomicUsize::new(0));
        let dispatcher = Dispatcher::with_sink(&sink);

        let response = dispatcher.dispatch(&Failure::api(Some(405), None));
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.body().code, "API_ERROR.GENERIC_ERROR");
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn only_unclassified_and_api_are_logged_by_default() {
        let sink = MemorySink::new(16, 1024);
        let dispatcher = Dispatcher::with_sink(&sink);

        let _ = dispatcher.dispatch(&Failure::validation("BLANK"));
        let _ = dispatcher.dispatch(&Failure::new(FailureCategory::Token));
        assert!(sink.is_empty());

        let _ = dispatcher.dispatch(&Failure::unclassified("boom"));
        let _ = dispatcher.dispatch(&Failure::api(None, None));
        let reasons: Vec<LogReason> = sink.get_all().iter().map(|e| e.reason).collect();
        assert_eq!(reasons, [LogReason::ApiError, LogReason::Unclassified]);
    }

    #[test]
    fn log_all_categories_logs_everything() {
        let sink = MemorySink::new(16, 1024);
        let dispatcher = Dispatcher::with_sink(&sink)
            .with_config(DispatchConfig::default().with_log_all_categories(true));

        let _ = dispatcher.dispatch(&Failure::new(FailureCategory::RateLimited));
        let entry = &sink.get_recent(1)[0];
        assert_eq!(entry.reason, LogReason::Classified);
        assert_eq!(entry.status, 429);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: DispatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DispatchConfig::default());

        let config: DispatchConfig =
            serde_json::from_str(r#"{"log_all_categories": true, "max_log_field_len": 64}"#).unwrap();
        assert!(config.log_all_categories);
        assert_eq!(config.max_log_field_len, 64);

        assert!(serde_json::from_str::<DispatchConfig>(r#"{"verbose": true}"#).is_err());
    }

    #[test]
    fn normalize_error_display() {
        let err = NormalizeError::Extraction {
            reason: "bad shape".into(),
        };
        assert_eq!(err.to_string(), "field error extraction failed: bad shape");
        assert_eq!(NormalizeError::Panicked.to_string(), "normalization panicked");
    }
}
